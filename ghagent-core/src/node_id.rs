//! GraphQL node-ID codec.
//!
//! The `nodes(ids:)` endpoint only accepts the server's opaque
//! identifier form, so hydration reconstructs it from the numeric
//! database IDs that session records carry: a MessagePack array of
//! compact non-negative integers, base64url-encoded without padding,
//! behind a type prefix. The byte sequence must match the server
//! exactly or lookups silently miss.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encode a pull-request node ID from its repository and pull-request
/// database IDs.
pub fn encode_pull_request_node_id(repo_id: u64, pull_request_id: u64) -> String {
    format!("PR_{}", encode_parts(&[0, repo_id, pull_request_id]))
}

/// Encode a user node ID from the user's database ID.
pub fn encode_user_node_id(user_id: u64) -> String {
    format!("U_{}", encode_parts(&[0, user_id]))
}

fn encode_parts(parts: &[u64]) -> String {
    let mut buf = Vec::with_capacity(1 + parts.len() * 9);
    // Infallible: Vec<u8> writes cannot fail and array lengths here are
    // tiny, so an encoder error is a programmer error.
    rmp::encode::write_array_len(&mut buf, parts.len() as u32)
        .expect("msgpack array header encoding");
    for &part in parts {
        rmp::encode::write_uint(&mut buf, part).expect("msgpack integer encoding");
    }
    URL_SAFE_NO_PAD.encode(buf)
}
