use std::io;

/// A byte source that can report how much data is ready without reading it.
///
/// The frame reader uses this to wait for a whole payload before touching
/// the stream, and the ingest loop uses it to avoid blocking on a partial
/// header.
pub trait Available {
    /// Number of bytes that can be read right now without blocking.
    fn available(&self) -> io::Result<usize>;
}

impl<T: Available + ?Sized> Available for &T {
    fn available(&self) -> io::Result<usize> {
        (**self).available()
    }
}

impl<T: Available + ?Sized> Available for &mut T {
    fn available(&self) -> io::Result<usize> {
        (**self).available()
    }
}
