use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::length_delimited::{Builder, LengthDelimitedCodec};
use tokio_util::codec::Framed;

pub(crate) fn make_protocol_builder() -> Builder {
    *LengthDelimitedCodec::builder()
        .little_endian()
        .max_frame_length(crate::MAX_FRAME_SIZE)
}

/// Wraps a byte stream into the framing used between the schedd and the negotiator.
/// Every frame carries exactly one message, so the frame boundary acts as end-of-message.
pub fn make_framed<T: AsyncRead + AsyncWrite>(stream: T) -> Framed<T, LengthDelimitedCodec> {
    make_protocol_builder().new_framed(stream)
}
