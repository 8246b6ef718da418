use std::path::Path;

pub trait Simplified {
    /// Render a [`Path`] for messages, relative to the working directory when it is inside it.
    ///
    /// On Windows, the `\\?\` prefix is stripped first.
    fn user_display(&self) -> std::path::Display<'_>;
}

impl<T: AsRef<Path>> Simplified for T {
    fn user_display(&self) -> std::path::Display<'_> {
        let path = dunce::simplified(self.as_ref());
        match std::env::current_dir() {
            Ok(cwd) => path.strip_prefix(cwd).unwrap_or(path).display(),
            Err(_) => path.display(),
        }
    }
}
