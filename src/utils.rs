use once_cell::sync::Lazy;

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

#[cfg(feature = "gui")]
pub fn glib_channel<T: Send + 'static>() -> (glib::Sender<T>, glib::Receiver<T>) {
    glib::MainContext::channel(glib::Priority::default())
}

/// Runs `fut` on the shared runtime and delivers its result on the GTK main loop.
#[cfg(feature = "gui")]
pub fn run_async_to_main<T, E, Fut>(fut: Fut) -> glib::Receiver<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = glib_channel::<Result<T, E>>();
    spawn_async(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
    rx
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Characters the recipient field accepts: digits, `+`, space and hyphen.
pub fn is_phone_input(raw: &str) -> bool {
    raw.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
}

pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_phone_number(digits: &str) -> bool {
    let count = phone_digits(digits).len();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&count)
}

/// Provider address for a private chat, `<digits>@c.us`.
pub fn chat_id(digits: &str) -> String {
    format!("{}@c.us", phone_digits(digits))
}
