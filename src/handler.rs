use crate::constants;
use crate::constraints::{Constraints, HeaderPolicy};
use crate::entry::MultipartEntry;
use crate::helpers;
use crate::input::{Interest, NioInput, ReadHandler};
use crate::line::Line;
use crate::scanner::{Completion, MultipartContext, PartHandler};
use crate::state::ScanStage;

/// Drives the scan of one multipart message.
///
/// Every notification resumes the state machine where the previous one left
/// off and runs it until the ready bytes are exhausted. Bytes are only
/// consumed from the input once they are known to be preamble, headers or a
/// boundary, or once the part reader took them.
pub(crate) struct MultipartReadHandler {
    context: MultipartContext,
    delimiter: Vec<u8>,
    constraints: Constraints,
    stage: ScanStage,
    entry: MultipartEntry,
    line: Line,
    final_boundary: bool,
    next_index: usize,
    /// Raw bytes of the current header block, terminators included.
    header_bytes: usize,
    part_limit: u64,
    part_handler: Box<dyn PartHandler>,
    completion: Option<Completion>,
}

impl MultipartReadHandler {
    pub(crate) fn new(
        context: MultipartContext,
        constraints: Constraints,
        part_handler: Box<dyn PartHandler>,
        completion: Completion,
    ) -> Self {
        let delimiter = constants::delimiter(context.boundary());
        let part_limit = constraints.size_limit.per_field;

        MultipartReadHandler {
            context,
            delimiter,
            constraints,
            stage: ScanStage::Preamble,
            entry: MultipartEntry::new(),
            line: Line::default(),
            final_boundary: false,
            next_index: 0,
            header_bytes: 0,
            part_limit,
            part_handler,
            completion: Some(completion),
        }
    }

    fn process(&mut self, input: &mut dyn NioInput) -> crate::Result<Interest> {
        loop {
            let waiting = match self.stage {
                ScanStage::Preamble => self.read_preamble(input)?,
                ScanStage::ParseHeaders => self.read_headers(input)?,
                ScanStage::StartBody => {
                    self.start_body()?;
                    None
                }
                ScanStage::Body => self.read_body(input)?,
                ScanStage::Reset => {
                    self.reset();
                    None
                }
                ScanStage::Finished => {
                    let epilogue = input.ready_bytes();
                    if epilogue > 0 {
                        trace!("ignoring {} bytes of epilogue", epilogue);
                        input.skip(epilogue);
                    }

                    self.complete(Ok(()));
                    return Ok(Interest::Done);
                }
            };

            if let Some(interest) = waiting {
                return Ok(interest);
            }
        }
    }

    fn read_preamble(&mut self, input: &mut dyn NioInput) -> crate::Result<Option<Interest>> {
        loop {
            let buf = input.chunk();

            if !self.line.scan(buf, 0) {
                if !input.is_at_end() {
                    if !self.line.could_be_boundary(buf, 0, &self.delimiter) && self.line.len() > 1 {
                        input.skip(self.line.len() - 1);
                        self.line.retain_last_byte();
                    }
                    return Ok(Some(Interest::Bytes(self.line.len() + 1)));
                }

                if self.line.len() == 0 {
                    return Err(crate::Error::IncompleteStream);
                }
                self.line.complete_at_eof();
            }

            let boundary = self.line.check_boundary(buf, 0, &self.delimiter);
            let final_boundary = self.line.is_final_boundary();

            input.skip(self.line.len());
            self.line.reset();

            if boundary {
                if final_boundary {
                    debug!("message has no parts");
                    self.final_boundary = true;
                    self.stage = ScanStage::Finished;
                } else {
                    self.stage = ScanStage::ParseHeaders;
                }
                return Ok(None);
            }
        }
    }

    fn read_headers(&mut self, input: &mut dyn NioInput) -> crate::Result<Option<Interest>> {
        let limit = self.constraints.size_limit.header_block;

        loop {
            let buf = input.chunk();
            let complete = self.line.scan(buf, 0);

            if self.header_bytes + self.line.len() > limit {
                return Err(crate::Error::HeaderSizeExceeded { limit });
            }

            if !complete {
                if !input.is_at_end() {
                    return Ok(Some(Interest::Bytes(self.line.len() + 1)));
                }

                return if self.header_bytes + self.line.len() == 0 {
                    Err(crate::Error::IncompleteStream)
                } else {
                    Err(crate::Error::IncompleteHeaders)
                };
            }

            let len = self.line.len();
            let content = self.line.content(buf, 0);

            if content.is_empty() {
                input.skip(len);
                self.line.reset();
                self.header_bytes = 0;
                self.stage = ScanStage::StartBody;
                return Ok(None);
            }

            match helpers::split_header_line(content) {
                Some((name, value)) => {
                    if self.entry.headers().len() >= self.constraints.max_headers {
                        return Err(crate::Error::TooManyHeaders {
                            limit: self.constraints.max_headers,
                        });
                    }
                    self.entry.append_header(&name, value);
                }
                None => match self.constraints.header_policy {
                    HeaderPolicy::Skip => {
                        warn!("skipping header line without a name: {:?}", String::from_utf8_lossy(content));
                    }
                    HeaderPolicy::Reject => {
                        return Err(crate::Error::MalformedHeader {
                            line: String::from_utf8_lossy(content).into_owned(),
                        });
                    }
                },
            }

            self.header_bytes += len;
            input.skip(len);
            self.line.reset();
        }
    }

    fn start_body(&mut self) -> crate::Result<()> {
        let index = self.next_index;
        self.next_index += 1;
        self.entry.begin(index);

        let name = self.entry.name();
        if !self.constraints.is_it_allowed(name) {
            return Err(crate::Error::UnknownField {
                field_name: name.map(str::to_owned),
            });
        }
        self.part_limit = self.constraints.size_limit.extract_size_limit_for(name);

        debug!(
            "part {} of {:?}: name {:?}, content type {:?}",
            index,
            self.context.boundary(),
            name,
            self.entry.content_type()
        );

        self.part_handler.handle(&mut self.entry)?;

        if !self.entry.has_reader() {
            trace!("no reader for part {}, skipping its body", index);
            self.entry.skip();
        }

        self.stage = ScanStage::Body;
        Ok(())
    }

    fn read_body(&mut self, input: &mut dyn NioInput) -> crate::Result<Option<Interest>> {
        loop {
            let start = self.entry.available + self.entry.reserved;
            let buf = input.chunk();

            if !self.line.scan(buf, start) {
                if !input.is_at_end() {
                    if !self.line.could_be_boundary(buf, start, &self.delimiter) && self.line.len() > 1 {
                        // too long or too different to be a boundary, keep
                        // only a possible `\r`
                        let released = self.line.len() - 1 + self.entry.reserved;
                        self.line.retain_last_byte();
                        self.release(input, released, 0)?;
                    }

                    let needed = self.entry.available + self.entry.reserved + self.line.len() + 1;
                    return Ok(Some(Interest::Bytes(needed)));
                }

                if self.line.len() == 0 {
                    return Err(crate::Error::IncompleteFieldData {
                        field_name: self.entry.name().map(str::to_owned),
                    });
                }
                self.line.complete_at_eof();
            }

            if self.line.check_boundary(buf, start, &self.delimiter) {
                self.finish_part(input);
                return Ok(None);
            }

            let len = self.line.len();
            let terminator = self.line.terminator_len();
            let released = self.entry.reserved + len - terminator;

            self.line.reset();
            self.release(input, released, terminator)?;
        }
    }

    fn release(&mut self, input: &mut dyn NioInput, released: usize, reserved: usize) -> crate::Result<()> {
        self.entry.release(released, reserved);

        if self.entry.released > self.part_limit {
            return Err(crate::Error::FieldSizeExceeded {
                limit: self.part_limit,
                field_name: self.entry.name().map(str::to_owned),
            });
        }

        self.entry.deliver(input);
        Ok(())
    }

    fn finish_part(&mut self, input: &mut dyn NioInput) {
        let reserved = self.entry.reserved;
        let boundary_len = self.line.len();
        self.final_boundary = self.line.is_final_boundary();

        self.entry.finish();
        self.entry.deliver(input);

        // whatever the reader left, the terminator before the boundary and
        // the boundary line itself
        input.skip(self.entry.available + reserved + boundary_len);
        self.entry.available = 0;

        trace!(
            "part {} finished after {} bytes",
            self.entry.index(),
            self.entry.released
        );
        self.stage = ScanStage::Reset;
    }

    fn reset(&mut self) {
        self.entry.reset();
        self.line.reset();
        self.header_bytes = 0;
        self.part_limit = self.constraints.size_limit.per_field;

        self.stage = if self.final_boundary {
            ScanStage::Finished
        } else {
            ScanStage::ParseHeaders
        };
    }

    fn complete(&mut self, result: crate::Result<()>) {
        if let Some(completion) = self.completion.take() {
            completion(result);
        }
    }
}

impl ReadHandler for MultipartReadHandler {
    fn on_data_available(&mut self, input: &mut dyn NioInput) -> crate::Result<Interest> {
        self.process(input)
    }

    fn on_all_data_read(&mut self, input: &mut dyn NioInput) -> crate::Result<()> {
        match self.process(input)? {
            Interest::Done => Ok(()),
            Interest::Bytes(_) => Err(crate::Error::IncompleteStream),
        }
    }

    fn on_error(&mut self, err: crate::Error) {
        debug!("multipart scan of {:?} failed: {}", self.context.boundary(), err);

        self.entry.abort();
        self.stage = ScanStage::Finished;
        self.complete(Err(err));
    }
}

impl Drop for MultipartReadHandler {
    fn drop(&mut self) {
        if self.completion.is_some() {
            self.entry.abort();
            self.complete(Err(crate::Error::StreamClosed));
        }
    }
}
