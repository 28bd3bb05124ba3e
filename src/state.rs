/// Where a [`MultipartReadHandler`](crate::handler::MultipartReadHandler) resumes
/// on its next notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanStage {
    Preamble,
    ParseHeaders,
    StartBody,
    Body,
    Reset,
    Finished,
}
