use std::cmp;

use crate::entry::MultipartEntry;
use crate::input::{Fired, NioInput, ReadHandler, Registration};

/// The body of one part seen as a [`NioInput`].
///
/// Only the entry's available bytes are visible. Reserved bytes stay hidden
/// since they may still turn out to be the start of the closing boundary. The
/// input ends once that boundary is found.
pub(crate) struct PartInput<'a> {
    inner: &'a mut dyn NioInput,
    entry: &'a mut MultipartEntry,
}

impl<'a> PartInput<'a> {
    pub(crate) fn new(inner: &'a mut dyn NioInput, entry: &'a mut MultipartEntry) -> Self {
        PartInput { inner, entry }
    }

    /// Notifies the part reader as long as its interest is satisfied.
    pub(crate) fn dispatch(&mut self) {
        while let Some(registration) = self.entry.registration.take() {
            if !registration.is_ready(&*self) {
                self.entry.registration = Some(registration);
                return;
            }

            let before = self.entry.available;
            match registration.fire(self) {
                Fired::Parked(registration) => {
                    let stalled = self.entry.available == before;
                    if self.entry.registration.is_none() {
                        self.entry.registration = Some(registration);
                    }
                    if stalled {
                        return;
                    }
                }
                Fired::Done | Fired::Failed => {
                    if self.entry.registration.is_none() {
                        // nobody reads the rest of this part
                        self.entry.skipping = true;
                        self.entry.available -= self.inner.skip(self.entry.available);
                    }
                }
            }
        }
    }
}

impl NioInput for PartInput<'_> {
    fn ready_bytes(&self) -> usize {
        self.entry.available
    }

    fn is_at_end(&self) -> bool {
        self.entry.finished
    }

    fn chunk(&self) -> &[u8] {
        &self.inner.chunk()[..self.entry.available]
    }

    fn skip(&mut self, n: usize) -> usize {
        let n = cmp::min(n, self.entry.available);
        let skipped = self.inner.skip(n);
        self.entry.available -= skipped;
        skipped
    }

    fn notify_available(&mut self, handler: Box<dyn ReadHandler>, threshold: usize) {
        self.entry.registration = Some(Registration::new(handler, threshold));
    }
}
