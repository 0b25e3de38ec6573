//! Packet framing on the forwarder's stream socket.
//!
//! Packets are self-delimiting: each is one outer TLV element, so a frame is
//! the element's type and length VarNumbers followed by `length` bytes.

use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest packet the forwarder will exchange.
pub const MAX_PACKET_SIZE: usize = 8800;

/// Read one VarNumber, appending its raw bytes to `raw`.
async fn read_var_number<R: AsyncRead + Unpin>(
    reader: &mut R,
    raw: &mut BytesMut,
) -> io::Result<u64> {
    let first = reader.read_u8().await?;
    raw.extend_from_slice(&[first]);
    let width = match first {
        253 => 2,
        254 => 4,
        255 => 8,
        small => return Ok(u64::from(small)),
    };
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[..width]).await?;
    raw.extend_from_slice(&buf[..width]);
    Ok(buf[..width]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Read one complete packet, header included.
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    read_var_number(reader, &mut buf).await?;
    let len = read_var_number(reader, &mut buf).await?;

    let header = buf.len();
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    if len > MAX_PACKET_SIZE.saturating_sub(header) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("packet too large: {} bytes", len),
        ));
    }

    buf.resize(header + len, 0);
    reader.read_exact(&mut buf[header..]).await?;

    Ok(buf.freeze())
}

/// Write one encoded packet.
pub async fn write_packet<W: AsyncWrite + Unpin>(writer: &mut W, packet: &[u8]) -> io::Result<()> {
    if packet.len() > MAX_PACKET_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("packet too large: {} bytes", packet.len()),
        ));
    }

    writer.write_all(packet).await?;
    writer.flush().await?;

    Ok(())
}
