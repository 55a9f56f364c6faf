use std::fmt::{self, Write};

/// A value that can be streamed into a [`Log`](crate::Log).
///
/// Implemented for every `Display` type, which covers booleans (`true` /
/// `false`), characters, every integer width, floats and strings in their
/// natural textual form.
pub trait Loggable {
    /// Appends the textual form of `self` to `buf`.
    fn render(&self, buf: &mut String);
}

impl<T> Loggable for T
where
    T: fmt::Display + ?Sized,
{
    fn render(&self, buf: &mut String) {
        // Writing into a String cannot fail.
        let _ = write!(buf, "{self}");
    }
}
