/// Surfaces short, non-blocking messages to the user.
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}
