use adw::prelude::*;
use adw::Application;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app = Application::builder()
        .application_id("com.example.WaChatGtk")
        .build();
    app.connect_activate(|app| match wachat_gtk::app::AppContext::from_environment() {
        Ok(ctx) => wachat_gtk::app::build_ui(app, ctx),
        Err(e) => log::error!("Cannot start: {}", e),
    });
    app.run();
}
