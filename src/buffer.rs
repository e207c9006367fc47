use crate::allocator::{Allocator, OutOfMemory};

/// A growable byte buffer used to accumulate the re-encoded bytes of a
/// string or member name, and the verbatim ASCII text of a number. Grows
/// geometrically, consulting an [`Allocator`] before every growth (spec
/// section 4.3, "Stack growth is geometric; both the allocate and
/// reallocate paths must be able to report OutOfMemory").
#[derive(Default)]
pub struct StringBuffer {
    bytes: Vec<u8>,
}

impl StringBuffer {
    pub fn new() -> Self {
        StringBuffer { bytes: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    fn ensure_capacity(
        &mut self,
        additional: usize,
        allocator: &mut dyn Allocator,
    ) -> Result<(), OutOfMemory> {
        if self.bytes.capacity() - self.bytes.len() >= additional {
            return Ok(());
        }
        let grow_to = (self.bytes.capacity() * 2).max(self.bytes.len() + additional).max(16);
        let extra = grow_to - self.bytes.len();
        allocator.reserve(extra)?;
        self.bytes
            .try_reserve(extra)
            .map_err(|_| OutOfMemory)
    }

    pub fn push_byte(
        &mut self,
        byte: u8,
        allocator: &mut dyn Allocator,
    ) -> Result<(), OutOfMemory> {
        self.ensure_capacity(1, allocator)?;
        self.bytes.push(byte);
        Ok(())
    }

    pub fn extend_from_slice(
        &mut self,
        data: &[u8],
        allocator: &mut dyn Allocator,
    ) -> Result<(), OutOfMemory> {
        self.ensure_capacity(data.len(), allocator)?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn into_boxed_slice(&self) -> Box<[u8]> {
        self.bytes.clone().into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::test_support::FailingAllocator;
    use crate::allocator::SystemAllocator;

    #[test]
    fn grows_and_stores_bytes() {
        let mut buf = StringBuffer::new();
        let mut alloc = SystemAllocator;
        for b in b"hello world, this is longer than sixteen bytes" {
            buf.push_byte(*b, &mut alloc).unwrap();
        }
        assert_eq!(buf.as_slice(), b"hello world, this is longer than sixteen bytes");
    }

    #[test]
    fn reports_out_of_memory() {
        let mut buf = StringBuffer::new();
        let mut alloc = FailingAllocator::new(1);
        assert!(buf.push_byte(b'a', &mut alloc).is_err());
    }
}
