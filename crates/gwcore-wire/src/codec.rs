use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::WireError;

pub(crate) fn encode_frame<T: Serialize>(
    identifier: [u8; 4],
    value: &T,
    max_frame_bytes: usize,
) -> Result<Vec<u8>, WireError> {
    let body = rmp_serde::to_vec_named(value).map_err(WireError::Encode)?;
    gwcore_net::pack_identified_frame(identifier, &body, max_frame_bytes).map_err(WireError::from)
}

pub(crate) fn decode_frame<T: DeserializeOwned>(
    identifier: [u8; 4],
    frame: &[u8],
    max_frame_bytes: usize,
) -> Result<T, WireError> {
    let body = gwcore_net::unpack_identified_frame(frame, identifier, max_frame_bytes)?;
    rmp_serde::from_slice(body).map_err(WireError::Decode)
}
