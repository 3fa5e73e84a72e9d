use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    length_prefixed::{read_length_prefixed_frame, write_length_prefixed_frame, LengthPrefixKind},
    IdentifiedFrameError,
};

const IDENTIFIER_LEN: usize = 4;
const LENGTH_PREFIX_LEN: usize = 4;

/// Packs an already-in-memory body into a `u32`-length-prefixed,
/// file-identified buffer, without touching any `AsyncRead`/`AsyncWrite`.
/// Used for message bodies and codec stream buffers that never leave process
/// memory as a standalone frame.
pub fn pack_identified_frame(
    identifier: [u8; 4],
    body: &[u8],
    max_frame_bytes: usize,
) -> Result<Vec<u8>, IdentifiedFrameError> {
    let inner_len = IDENTIFIER_LEN + body.len();
    if inner_len > max_frame_bytes {
        return Err(IdentifiedFrameError::LengthPrefixed(
            crate::LengthPrefixedError::FrameTooLarge {
                frame_len: inner_len,
                max_frame_bytes,
            },
        ));
    }

    let prefix = u32::try_from(inner_len).map_err(|_| {
        IdentifiedFrameError::LengthPrefixed(crate::LengthPrefixedError::PrefixOverflow {
            prefix: "u32_be",
            frame_len: inner_len,
        })
    })?;

    let mut framed = Vec::with_capacity(LENGTH_PREFIX_LEN + inner_len);
    framed.extend_from_slice(&prefix.to_be_bytes());
    framed.extend_from_slice(&identifier);
    framed.extend_from_slice(body);
    Ok(framed)
}

/// Inverse of [`pack_identified_frame`]: splits a buffer into its identifier
/// and body, requiring the identifier to equal `expected`.
pub fn unpack_identified_frame(
    frame: &[u8],
    expected: [u8; 4],
    max_frame_bytes: usize,
) -> Result<&[u8], IdentifiedFrameError> {
    if frame.len() < LENGTH_PREFIX_LEN + IDENTIFIER_LEN {
        return Err(IdentifiedFrameError::LengthPrefixed(
            crate::LengthPrefixedError::FrameTooLarge {
                frame_len: frame.len(),
                max_frame_bytes: LENGTH_PREFIX_LEN + IDENTIFIER_LEN,
            },
        ));
    }

    let prefix_len =
        u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    let inner = &frame[LENGTH_PREFIX_LEN..];
    if prefix_len != inner.len() || prefix_len > max_frame_bytes {
        return Err(IdentifiedFrameError::LengthPrefixed(
            crate::LengthPrefixedError::FrameTooLarge {
                frame_len: prefix_len,
                max_frame_bytes,
            },
        ));
    }

    let mut identifier = [0_u8; IDENTIFIER_LEN];
    identifier.copy_from_slice(&inner[..IDENTIFIER_LEN]);
    if identifier != expected {
        return Err(IdentifiedFrameError::IdentifierMismatch {
            expected,
            found: identifier,
        });
    }

    Ok(&inner[IDENTIFIER_LEN..])
}

/// Reads a `u32`-length-prefixed frame whose first four bytes are a file
/// identifier (e.g. `"SBCH"`/`"SBNO"`), and returns the identifier plus body.
pub async fn read_identified_frame<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> Result<([u8; 4], Vec<u8>), IdentifiedFrameError>
where
    R: AsyncRead + Unpin,
{
    let frame = read_length_prefixed_frame(reader, LengthPrefixKind::U32Be, max_frame_bytes)
        .await
        .map_err(IdentifiedFrameError::LengthPrefixed)?;

    if frame.len() < IDENTIFIER_LEN {
        return Err(IdentifiedFrameError::LengthPrefixed(
            crate::LengthPrefixedError::FrameTooLarge {
                frame_len: frame.len(),
                max_frame_bytes: IDENTIFIER_LEN,
            },
        ));
    }

    let mut identifier = [0_u8; IDENTIFIER_LEN];
    identifier.copy_from_slice(&frame[..IDENTIFIER_LEN]);
    Ok((identifier, frame[IDENTIFIER_LEN..].to_vec()))
}

/// Reads an identified frame, requiring the identifier to equal `expected`.
pub async fn read_identified_frame_expect<R>(
    reader: &mut R,
    expected: [u8; 4],
    max_frame_bytes: usize,
) -> Result<Vec<u8>, IdentifiedFrameError>
where
    R: AsyncRead + Unpin,
{
    let (found, body) = read_identified_frame(reader, max_frame_bytes).await?;
    if found != expected {
        return Err(IdentifiedFrameError::IdentifierMismatch { expected, found });
    }
    Ok(body)
}

pub async fn write_identified_frame<W>(
    writer: &mut W,
    identifier: [u8; 4],
    body: &[u8],
    max_frame_bytes: usize,
) -> Result<(), IdentifiedFrameError>
where
    W: AsyncWrite + Unpin,
{
    let mut framed = Vec::with_capacity(IDENTIFIER_LEN + body.len());
    framed.extend_from_slice(&identifier);
    framed.extend_from_slice(body);

    write_length_prefixed_frame(writer, LengthPrefixKind::U32Be, &framed, max_frame_bytes)
        .await
        .map_err(IdentifiedFrameError::LengthPrefixed)
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::{
        pack_identified_frame, read_identified_frame_expect, unpack_identified_frame,
        write_identified_frame,
    };
    use crate::IdentifiedFrameError;

    #[test]
    fn pack_unpack_round_trip() {
        let framed = pack_identified_frame(*b"SBCH", b"payload", 1024).expect("pack should work");
        let body = unpack_identified_frame(&framed, *b"SBCH", 1024).expect("unpack should work");
        assert_eq!(body, b"payload");
    }

    #[test]
    fn unpack_rejects_mismatched_identifier() {
        let framed = pack_identified_frame(*b"SBNO", b"payload", 1024).expect("pack should work");
        let error = unpack_identified_frame(&framed, *b"SBCH", 1024)
            .expect_err("mismatch should fail");
        match error {
            IdentifiedFrameError::IdentifierMismatch { expected, found } => {
                assert_eq!(expected, *b"SBCH");
                assert_eq!(found, *b"SBNO");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn round_trips_identified_frame() {
        let (mut writer, mut reader) = duplex(256);
        tokio::spawn(async move {
            write_identified_frame(&mut writer, *b"SBCH", b"payload", 1024)
                .await
                .expect("write should succeed");
        });

        let body = read_identified_frame_expect(&mut reader, *b"SBCH", 1024)
            .await
            .expect("read should succeed");
        assert_eq!(body, b"payload");
    }

    #[tokio::test]
    async fn rejects_mismatched_identifier() {
        let (mut writer, mut reader) = duplex(256);
        tokio::spawn(async move {
            write_identified_frame(&mut writer, *b"SBNO", b"payload", 1024)
                .await
                .expect("write should succeed");
        });

        let error = read_identified_frame_expect(&mut reader, *b"SBCH", 1024)
            .await
            .expect_err("mismatch should fail");
        match error {
            IdentifiedFrameError::IdentifierMismatch { expected, found } => {
                assert_eq!(expected, *b"SBCH");
                assert_eq!(found, *b"SBNO");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
