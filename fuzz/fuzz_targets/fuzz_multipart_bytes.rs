#![no_main]

use std::convert::Infallible;

use futures_util::stream;
use libfuzzer_sys::fuzz_target;
use multiscan::bytes::Bytes;
use multiscan::{Multipart, MultipartEntry, MultipartScanner, StreamBuffer};
use tokio::runtime;

const CONTENT_TYPE: &str = "multipart/form-data; boundary=X-BOUNDARY";

fn read_everything(entry: &mut MultipartEntry) -> multiscan::Result<()> {
    if entry.is_multipart() {
        MultipartScanner::new().scan_part(entry, read_everything, |_| {});
        Ok(())
    } else {
        entry.read_to_bytes(|_| {})
    }
}

fuzz_target!(|data: &[u8]| {
    // the first byte picks the chunk size so split points get explored too
    let size = data.first().map_or(1, |b| *b as usize % 16 + 1);

    let mut buffer = StreamBuffer::new();
    MultipartScanner::new().scan(&mut buffer, Some(CONTENT_TYPE), read_everything, |_| {});
    for chunk in data.chunks(size) {
        buffer.feed(chunk);
    }
    buffer.finish();

    let chunks: Vec<Result<Bytes, Infallible>> = data.chunks(size).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
    let multipart = Multipart::new(stream::iter(chunks), CONTENT_TYPE);

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    let _ = rt.block_on(multipart.scan(read_everything));
});
