use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use multiscan::{
    Constraints, HeaderPolicy, Interest, Multipart, MultipartEntry, MultipartScanner, NioInput, ReadHandler, SizeLimit,
    StreamBuffer, TextInput, TextReadHandler,
};

const CONTENT_TYPE: &str = "multipart/form-data; boundary=XYZ";

#[derive(Debug, Default, PartialEq)]
struct Part {
    index: usize,
    name: Option<String>,
    file_name: Option<String>,
    content_type: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    error: Option<String>,
}

type Parts = Arc<Mutex<Vec<Part>>>;
type Outcome = Arc<Mutex<Option<multiscan::Result<()>>>>;

fn recorder(parts: &Parts) -> impl FnMut(&mut MultipartEntry) -> multiscan::Result<()> + Send + 'static {
    let parts = Arc::clone(parts);

    move |entry: &mut MultipartEntry| {
        let idx = {
            let mut parts = parts.lock().unwrap();
            parts.push(Part {
                index: entry.index(),
                name: entry.name().map(str::to_owned),
                file_name: entry.file_name().map(str::to_owned),
                content_type: entry.content_type().to_owned(),
                headers: entry
                    .headers()
                    .iter()
                    .map(|(name, value)| (name.to_owned(), String::from_utf8_lossy(value).into_owned()))
                    .collect(),
                ..Part::default()
            });
            parts.len() - 1
        };

        let parts = Arc::clone(&parts);
        entry.read_to_bytes(move |body| {
            let mut parts = parts.lock().unwrap();
            let part = &mut parts[idx];
            match body {
                Ok(body) => part.body = body.to_vec(),
                Err(err) => part.error = Some(err.to_string()),
            }
        })
    }
}

fn byte_stream(data: &[u8]) -> impl Stream<Item = multiscan::Result<Bytes>> + Send + 'static {
    let chunks: Vec<_> = data.chunks(1).map(|chunk| Ok(Bytes::copy_from_slice(chunk))).collect();
    stream::iter(chunks)
}

/// Feeds `message` to a scan in chunks of `size` bytes.
fn scan_chunked(scanner: &MultipartScanner, message: &[u8], size: usize) -> (Vec<Part>, Option<multiscan::Result<()>>) {
    let parts: Parts = Arc::default();
    let outcome: Outcome = Arc::default();
    let slot = Arc::clone(&outcome);

    let mut buffer = StreamBuffer::new();
    scanner.scan(&mut buffer, Some(CONTENT_TYPE), recorder(&parts), move |result| {
        *slot.lock().unwrap() = Some(result)
    });

    for chunk in message.chunks(size) {
        buffer.feed(chunk);
    }
    buffer.finish();

    let parts = std::mem::take(&mut *parts.lock().unwrap());
    let outcome = outcome.lock().unwrap().take();
    (parts, outcome)
}

fn bodies(parts: &[Part]) -> Vec<&[u8]> {
    parts.iter().map(|part| part.body.as_slice()).collect()
}

#[tokio::test]
async fn test_multipart_basic() {
    let data = "preamble text\r\n--XYZ\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\nvalue1\r\n--XYZ\r\nContent-Disposition: form-data; name=\"field2\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nvalue2\r\n--XYZ--\r\n";
    let parts: Parts = Arc::default();

    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    assert_eq!(multipart.scan(recorder(&parts)).await, Ok(()));

    let parts = parts.lock().unwrap();
    assert_eq!(parts.len(), 2);

    assert_eq!(parts[0].index, 0);
    assert_eq!(parts[0].name.as_deref(), Some("field1"));
    assert_eq!(parts[0].file_name, None);
    assert_eq!(parts[0].content_type, "text/plain; charset=US-ASCII");
    assert_eq!(parts[0].body, b"value1");

    assert_eq!(parts[1].index, 1);
    assert_eq!(parts[1].name.as_deref(), Some("field2"));
    assert_eq!(parts[1].file_name.as_deref(), Some("a.txt"));
    assert_eq!(parts[1].content_type, "text/plain");
    assert_eq!(parts[1].body, b"value2");
}

#[tokio::test]
async fn test_multipart_empty() {
    let parts: Parts = Arc::default();

    let multipart = Multipart::new(byte_stream(b"--XYZ--\r\n"), CONTENT_TYPE);
    assert_eq!(multipart.scan(recorder(&parts)).await, Ok(()));
    assert!(parts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_multipart_header_names() {
    let data = "--XYZ\r\nCONTENT-DISPOSITION: form-data; name=\"a\"\r\nX-Custom-Header :  some value \r\nx-custom-header: another\r\n\r\nv\r\n--XYZ--\r\n";
    let parts: Parts = Arc::default();

    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    assert_eq!(multipart.scan(recorder(&parts)).await, Ok(()));

    let parts = parts.lock().unwrap();
    assert_eq!(
        parts[0].headers,
        vec![
            ("content-disposition".to_owned(), "form-data; name=\"a\"".to_owned()),
            ("x-custom-header".to_owned(), "some value".to_owned()),
            ("x-custom-header".to_owned(), "another".to_owned()),
        ]
    );
}

#[test]
fn test_headers_are_kept_as_received() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\nX Custom: v\r\nX-A: 1\r\nX-Ctl: a\x7fb\r\nX-B: 2\r\nx-a: 3\r\n\r\nbody\r\n--XYZ--\r\n";

    for size in [1, 4, message.len()].iter() {
        let (parts, outcome) = scan_chunked(&MultipartScanner::new(), message, *size);

        assert_eq!(outcome, Some(Ok(())));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"body".to_vec());
        assert_eq!(
            parts[0].headers,
            vec![
                ("content-disposition".to_owned(), "form-data; name=\"a\"".to_owned()),
                ("x custom".to_owned(), "v".to_owned()),
                ("x-a".to_owned(), "1".to_owned()),
                ("x-ctl".to_owned(), "a\x7fb".to_owned()),
                ("x-b".to_owned(), "2".to_owned()),
                ("x-a".to_owned(), "3".to_owned()),
            ]
        );
    }
}

#[test]
fn test_chunk_boundary_independence() {
    let mut message = Vec::new();
    message.extend_from_slice(b"--XYZ\r\nContent-Disposition: form-data; name=\"bin\"\r\n\r\n");
    message.extend_from_slice(b"\x00\xff\r\n--XY\r\n--XYZW\r\nmid--XYZ--\r\n\r\rlone cr\nlf only\r\n\r\n");
    message.extend_from_slice(b"\r\n--XYZ\r\nContent-Disposition: form-data; name=\"empty\"\r\n\r\n");
    message.extend_from_slice(b"\r\n--XYZ\r\nContent-Disposition: form-data; name=\"last\"\r\n\r\n--XYZ--");

    let expected: Vec<&[u8]> = vec![
        &b"\x00\xff\r\n--XY\r\n--XYZW\r\nmid--XYZ--\r\n\r\rlone cr\nlf only\r\n\r\n"[..],
        &b""[..],
        &b""[..],
    ];

    let scanner = MultipartScanner::new();
    let (whole, outcome) = scan_chunked(&scanner, &message, message.len());
    assert_eq!(outcome, Some(Ok(())));
    assert_eq!(bodies(&whole), expected);

    for size in 1..=9 {
        let (parts, outcome) = scan_chunked(&scanner, &message, size);
        assert_eq!(outcome, Some(Ok(())), "chunk size {}", size);
        assert_eq!(parts, whole, "chunk size {}", size);
    }
}

#[test]
fn test_final_boundary_without_line_terminator() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue\r\n--XYZ--";
    let (parts, outcome) = scan_chunked(&MultipartScanner::new(), message, 1);

    assert_eq!(outcome, Some(Ok(())));
    assert_eq!(bodies(&parts), vec![&b"value"[..]]);
}

#[test]
fn test_truncated_after_boundary() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue\r\n--XYZ\r\n";
    let (parts, outcome) = scan_chunked(&MultipartScanner::new(), message, 4);

    assert_eq!(outcome, Some(Err(multiscan::Error::IncompleteStream)));
    assert_eq!(bodies(&parts), vec![&b"value"[..]]);
}

#[test]
fn test_truncated_part_notifies_reader() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nval";
    let (parts, outcome) = scan_chunked(&MultipartScanner::new(), message, 4);

    let err = multiscan::Error::IncompleteFieldData {
        field_name: Some("a".to_owned()),
    };
    assert_eq!(parts[0].error, Some(err.to_string()));
    assert_eq!(outcome, Some(Err(err)));
}

#[test]
fn test_nested_multipart_mixed() {
    let message = concat!(
        "--XYZ\r\n",
        "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
        "hello\r\n",
        "--XYZ\r\n",
        "Content-Disposition: form-data; name=\"files\"\r\n",
        "Content-Type: multipart/mixed; boundary=BBB\r\n\r\n",
        "--BBB\r\n",
        "Content-Disposition: file; filename=\"one.txt\"\r\n\r\n",
        "first file\r\n--XYZ is not our boundary\r\n",
        "--BBB\r\n",
        "Content-Disposition: file; filename=\"two.txt\"\r\n\r\n",
        "second file\r\n",
        "--BBB--\r\n",
        "--XYZ\r\n",
        "Content-Disposition: form-data; name=\"after\"\r\n\r\n",
        "tail\r\n",
        "--XYZ--\r\n",
    );

    for size in [1, 5, message.len()].iter() {
        let outer: Parts = Arc::default();
        let inner: Parts = Arc::default();
        let nested_outcome: Outcome = Arc::default();
        let outcome: Outcome = Arc::default();

        let mut record = recorder(&outer);
        let inner_parts = Arc::clone(&inner);
        let nested_slot = Arc::clone(&nested_outcome);
        let slot = Arc::clone(&outcome);

        let mut buffer = StreamBuffer::new();
        MultipartScanner::new().scan(
            &mut buffer,
            Some(CONTENT_TYPE),
            move |entry: &mut MultipartEntry| {
                if !entry.is_multipart() {
                    return record(entry);
                }

                let nested_slot = Arc::clone(&nested_slot);
                MultipartScanner::new().scan_part(entry, recorder(&inner_parts), move |result| {
                    *nested_slot.lock().unwrap() = Some(result)
                });
                Ok(())
            },
            move |result| *slot.lock().unwrap() = Some(result),
        );

        for chunk in message.as_bytes().chunks(*size) {
            buffer.feed(chunk);
        }
        buffer.finish();

        assert_eq!(*outcome.lock().unwrap(), Some(Ok(())));
        assert_eq!(*nested_outcome.lock().unwrap(), Some(Ok(())));

        let outer = outer.lock().unwrap();
        assert_eq!(bodies(&outer), vec![&b"hello"[..], &b"tail"[..]]);
        assert_eq!(outer[1].index, 2);

        let inner = inner.lock().unwrap();
        assert_eq!(inner[0].file_name.as_deref(), Some("one.txt"));
        assert_eq!(inner[1].file_name.as_deref(), Some("two.txt"));
        assert_eq!(
            bodies(&inner),
            vec![&b"first file\r\n--XYZ is not our boundary"[..], &b"second file"[..]]
        );
    }
}

#[test]
fn test_nested_failure_stays_in_its_part() {
    let message = concat!(
        "--XYZ\r\n",
        "Content-Disposition: form-data; name=\"files\"\r\n",
        "Content-Type: multipart/mixed; boundary=BBB\r\n\r\n",
        "--BBB\r\n",
        "Content-Disposition: file; filename=\"one.txt\"\r\n\r\n",
        "never closed\r\n",
        "--XYZ\r\n",
        "Content-Disposition: form-data; name=\"after\"\r\n\r\n",
        "tail\r\n",
        "--XYZ--\r\n",
    );

    let outer: Parts = Arc::default();
    let nested_outcome: Outcome = Arc::default();
    let outcome: Outcome = Arc::default();

    let mut record = recorder(&outer);
    let nested_slot = Arc::clone(&nested_outcome);
    let slot = Arc::clone(&outcome);

    let mut buffer = StreamBuffer::new();
    MultipartScanner::new().scan(
        &mut buffer,
        Some(CONTENT_TYPE),
        move |entry: &mut MultipartEntry| {
            if !entry.is_multipart() {
                return record(entry);
            }

            let nested_slot = Arc::clone(&nested_slot);
            MultipartScanner::new().scan_part(
                entry,
                |_: &mut MultipartEntry| -> multiscan::Result<()> { Ok(()) },
                move |result| *nested_slot.lock().unwrap() = Some(result),
            );
            Ok(())
        },
        move |result| *slot.lock().unwrap() = Some(result),
    );

    buffer.feed(message);
    buffer.finish();

    assert_eq!(
        *nested_outcome.lock().unwrap(),
        Some(Err(multiscan::Error::IncompleteFieldData { field_name: None }))
    );
    assert_eq!(*outcome.lock().unwrap(), Some(Ok(())));
    assert_eq!(bodies(&outer.lock().unwrap()), vec![&b"tail"[..]]);
}

#[test]
fn test_unread_parts_are_skipped() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nskip me\r\n--XYZ\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\nkeep me\r\n--XYZ--\r\n";

    let kept: Parts = Arc::default();
    let outcome: Outcome = Arc::default();
    let mut record = recorder(&kept);
    let slot = Arc::clone(&outcome);

    let mut buffer = StreamBuffer::new();
    MultipartScanner::new().scan(
        &mut buffer,
        Some(CONTENT_TYPE),
        move |entry: &mut MultipartEntry| {
            if entry.name() == Some("b") {
                record(entry)
            } else {
                Ok(())
            }
        },
        move |result| *slot.lock().unwrap() = Some(result),
    );

    for chunk in message.chunks(3) {
        buffer.feed(chunk);
    }

    assert_eq!(*outcome.lock().unwrap(), Some(Ok(())));
    assert_eq!(bodies(&kept.lock().unwrap()), vec![&b"keep me"[..]]);
}

/// Takes at most `step` bytes per notification and asks for `step` more.
struct Stepper {
    step: usize,
    out: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ReadHandler for Stepper {
    fn on_data_available(&mut self, input: &mut dyn NioInput) -> multiscan::Result<Interest> {
        let chunk = input.read_bytes(self.step);
        self.out.lock().unwrap().push(chunk.to_vec());
        Ok(Interest::Bytes(self.step))
    }

    fn on_all_data_read(&mut self, input: &mut dyn NioInput) -> multiscan::Result<()> {
        while input.ready_bytes() > 0 {
            let chunk = input.read_bytes(self.step);
            self.out.lock().unwrap().push(chunk.to_vec());
        }
        Ok(())
    }
}

#[test]
fn test_reader_thresholds() {
    let message = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n0123456789abcdef\r\n--XYZ--\r\n";

    let out = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&out);
    let outcome: Outcome = Arc::default();
    let slot = Arc::clone(&outcome);

    let mut buffer = StreamBuffer::new();
    MultipartScanner::new().scan(
        &mut buffer,
        Some(CONTENT_TYPE),
        move |entry: &mut MultipartEntry| {
            entry.read_bytes(Stepper {
                step: 4,
                out: Arc::clone(&sink),
            })
        },
        move |result| *slot.lock().unwrap() = Some(result),
    );

    for chunk in message.chunks(1) {
        buffer.feed(chunk);
    }

    assert_eq!(*outcome.lock().unwrap(), Some(Ok(())));

    let out = out.lock().unwrap();
    assert_eq!(out.concat(), b"0123456789abcdef".to_vec());
    assert!(out.iter().all(|chunk| chunk.len() <= 4));
}

#[tokio::test]
async fn test_constraints_unknown_field() {
    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"allowed\"\r\n\r\nv\r\n--XYZ\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nv\r\n--XYZ--\r\n";
    let parts: Parts = Arc::default();
    let constraints = Constraints::new().allowed_fields(vec!["allowed"]);

    let multipart = Multipart::new_with_constraints(byte_stream(data.as_bytes()), CONTENT_TYPE, constraints);
    let result = multipart.scan(recorder(&parts)).await;

    assert_eq!(
        result,
        Err(multiscan::Error::UnknownField {
            field_name: Some("other".to_owned())
        })
    );
    assert_eq!(bodies(&parts.lock().unwrap()), vec![&b"v"[..]]);
}

#[tokio::test]
async fn test_constraints_size_limit() {
    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"small\"\r\n\r\n0123456789\r\n--XYZ--\r\n";
    let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(100).for_field("small", 5));

    let parts: Parts = Arc::default();
    let multipart = Multipart::new_with_constraints(byte_stream(data.as_bytes()), CONTENT_TYPE, constraints);
    let result = multipart.scan(recorder(&parts)).await;

    assert_eq!(
        result,
        Err(multiscan::Error::FieldSizeExceeded {
            limit: 5,
            field_name: Some("small".to_owned())
        })
    );
}

#[tokio::test]
async fn test_header_policy_reject() {
    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n: no name\r\n\r\nv\r\n--XYZ--\r\n";

    let parts: Parts = Arc::default();
    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    assert_eq!(multipart.scan(recorder(&parts)).await, Ok(()));
    assert_eq!(bodies(&parts.lock().unwrap()), vec![&b"v"[..]]);

    let constraints = Constraints::new().header_policy(HeaderPolicy::Reject);
    let multipart = Multipart::new_with_constraints(byte_stream(data.as_bytes()), CONTENT_TYPE, constraints);
    let result = multipart
        .scan(|_: &mut MultipartEntry| -> multiscan::Result<()> { Ok(()) })
        .await;

    assert_eq!(
        result,
        Err(multiscan::Error::MalformedHeader {
            line: ": no name".to_owned()
        })
    );
}

#[tokio::test]
async fn test_read_mode_conflict() {
    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nv\r\n--XYZ--\r\n";
    let conflict = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&conflict);

    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    let result = multipart
        .scan(move |entry: &mut MultipartEntry| {
            entry.read_to_bytes(|_| {})?;
            *slot.lock().unwrap() = Some(entry.read_to_string(|_| {}));
            Ok(())
        })
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(
        conflict.lock().unwrap().take(),
        Some(Err(multiscan::Error::ReadModeConflict {
            current: multiscan::ReadMode::Bytes,
            requested: multiscan::ReadMode::Text,
        }))
    );
}

#[tokio::test]
async fn test_handler_error_ends_scan() {
    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nv\r\n--XYZ--\r\n";

    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    let result = multipart
        .scan(|_: &mut MultipartEntry| -> multiscan::Result<()> { Err(multiscan::Error::handler("rejected")) })
        .await;

    assert_eq!(result, Err(multiscan::Error::handler("rejected")));
}

#[test]
fn test_bad_content_types() {
    let cases = [
        (None, multiscan::Error::MissingContentType),
        (Some("application/x-www-form-urlencoded"), multiscan::Error::NoMultipart),
        (Some("multipart/form-data; charset=utf-8"), multiscan::Error::NoBoundary),
    ];

    for (content_type, expected) in cases.iter() {
        let outcome: Outcome = Arc::default();
        let slot = Arc::clone(&outcome);

        let mut buffer = StreamBuffer::new();
        MultipartScanner::new().scan(
            &mut buffer,
            *content_type,
            |_: &mut MultipartEntry| -> multiscan::Result<()> { Ok(()) },
            move |result| *slot.lock().unwrap() = Some(result),
        );

        let outcome = outcome.lock().unwrap().take();
        assert_eq!(outcome.as_ref().and_then(|result| result.as_ref().err()), Some(expected));
    }
}

#[tokio::test]
async fn test_text_charsets() {
    let mut data = Vec::new();
    data.extend_from_slice(b"--XYZ\r\nContent-Disposition: form-data; name=\"latin\"\r\nContent-Type: text/plain; charset=iso-8859-1\r\n\r\n");
    data.extend_from_slice(b"caf\xe9\r\n");
    data.extend_from_slice(b"--XYZ\r\nContent-Disposition: form-data; name=\"utf8\"\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n");
    data.extend_from_slice("你好, world\r\n".as_bytes());
    data.extend_from_slice(b"--XYZ--\r\n");

    let texts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&texts);

    let multipart = Multipart::new(byte_stream(&data), CONTENT_TYPE);
    let result = multipart
        .scan(move |entry: &mut MultipartEntry| {
            let sink = Arc::clone(&sink);
            entry.read_to_string(move |text| sink.lock().unwrap().push(text))
        })
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(
        *texts.lock().unwrap(),
        vec![Ok("café".to_owned()), Ok("你好, world".to_owned())]
    );
}

/// Counts decoded chars as they arrive.
struct CharCounter {
    chars: Arc<Mutex<usize>>,
}

impl TextReadHandler for CharCounter {
    fn on_text_available(&mut self, input: &mut TextInput<'_>) -> multiscan::Result<Interest> {
        *self.chars.lock().unwrap() += input.read_string().chars().count();
        Ok(Interest::Bytes(1))
    }

    fn on_all_text_read(&mut self, input: &mut TextInput<'_>) -> multiscan::Result<()> {
        *self.chars.lock().unwrap() += input.read_string().chars().count();
        Ok(())
    }
}

#[tokio::test]
async fn test_streaming_text_reader() {
    let mut data = Vec::new();
    data.extend_from_slice(b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\nContent-Type: text/plain\r\n\r\n");
    data.extend_from_slice("ñandú 🦀\r\n--XYZ--\r\n".as_bytes());

    let chars = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&chars);

    let multipart = Multipart::new(byte_stream(&data), CONTENT_TYPE);
    let result = multipart
        .scan(move |entry: &mut MultipartEntry| {
            entry.read_text_with_charset(
                CharCounter {
                    chars: Arc::clone(&counter),
                },
                "utf-8",
            )
        })
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(*chars.lock().unwrap(), "ñandú 🦀".chars().count());
}

#[cfg(feature = "json")]
#[tokio::test]
async fn test_read_json() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Payload {
        id: u32,
        tags: Vec<String>,
    }

    let data = "--XYZ\r\nContent-Disposition: form-data; name=\"meta\"\r\nContent-Type: application/json\r\n\r\n{\"id\": 7, \"tags\": [\"a\", \"b\"]}\r\n--XYZ\r\nContent-Disposition: form-data; name=\"broken\"\r\n\r\n{\r\n--XYZ--\r\n";

    let payloads = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&payloads);

    let multipart = Multipart::new(byte_stream(data.as_bytes()), CONTENT_TYPE);
    let result = multipart
        .scan(move |entry: &mut MultipartEntry| {
            let sink = Arc::clone(&sink);
            entry.read_json(move |payload: multiscan::Result<Payload>| sink.lock().unwrap().push(payload))
        })
        .await;

    assert_eq!(result, Ok(()));

    let payloads = payloads.lock().unwrap();
    assert_eq!(
        payloads[0],
        Ok(Payload {
            id: 7,
            tags: vec!["a".to_owned(), "b".to_owned()]
        })
    );
    assert!(matches!(payloads[1], Err(multiscan::Error::DecodeJson(_))));
}
