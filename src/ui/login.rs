use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;

use crate::app::AppContext;
use crate::login::LoginViewModel;

pub fn show_login_window(app: &Application, ctx: AppContext) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("WhatsApp Login")
        .default_width(420)
        .default_height(260)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Connect your Green API instance"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let instance_entry = gtk::Entry::new();
    instance_entry.set_placeholder_text(Some("ID Instance"));
    instance_entry.set_hexpand(true);

    let token_entry = gtk::PasswordEntry::new();
    token_entry.set_placeholder_text(Some("API Token"));
    token_entry.set_show_peek_icon(true);
    token_entry.set_hexpand(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&instance_entry);
    form.append(&token_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let login_btn = gtk::Button::with_label("Log in");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("WhatsApp"));
    header.set_title_widget(Some(&title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_login = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let instance_entry = instance_entry.clone();
        let token_entry = token_entry.clone();
        let login_btn = login_btn.clone();
        move || {
            let vm = LoginViewModel {
                instance_id: instance_entry.text().to_string(),
                api_token: token_entry.text().to_string(),
            };
            if let Err(e) = vm.submit(&ctx.store) {
                overlay.add_toast(adw::Toast::new(&e.to_string()));
                return;
            }

            status.set_label("Checking instance…");
            login_btn.set_sensitive(false);

            // Informational only: the credentials are already stored.
            let api = ctx.api.clone();
            let rx: glib::Receiver<Result<String, ()>> = crate::utils::run_async_to_main(async move {
                Ok(vm.check_instance(api.as_ref()).await)
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let ctx2 = ctx.clone();
            rx.attach(None, move |res| {
                if let Ok(message) = res {
                    log::info!("Instance check: {message}");
                    status_label.set_label(&message);
                }
                crate::ui::main_window::show_main_window(&app2, ctx2.clone());
                window2.close();
                glib::ControlFlow::Continue
            });
        }
    };

    use std::rc::Rc;
    let on_login: Rc<dyn Fn()> = Rc::new(on_login);
    {
        let on_login = on_login.clone();
        login_btn.connect_clicked(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        instance_entry.connect_activate(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        token_entry.connect_activate(move |_| (on_login)());
    }

    window.present();
}
