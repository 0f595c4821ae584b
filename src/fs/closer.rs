use std::fs;
use std::io;
use tracing::debug;

/// A resource that can be released with an observable result
pub trait Close: Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

// std reports no error from close(2), so releasing the descriptor cannot fail here.
impl Close for fs::File {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl Close for memmap2::Mmap {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

/// Closes several resources in order, stopping at the first failure.
///
/// Resources after the failing one are never closed through [`Close`]; they
/// are only dropped.
pub struct CompositeCloser {
    resources: Vec<Box<dyn Close>>,
}

impl CompositeCloser {
    pub fn new(resources: Vec<Box<dyn Close>>) -> Self {
        Self { resources }
    }
}

impl Close for CompositeCloser {
    fn close(self: Box<Self>) -> io::Result<()> {
        let total = self.resources.len();
        for (index, resource) in self.resources.into_iter().enumerate() {
            if let Err(e) = resource.close() {
                debug!(
                    index,
                    remaining = total - index - 1,
                    error = %e,
                    "Composite close stopped at failing resource"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
