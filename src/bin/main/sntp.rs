use embassy_net::{
    IpEndpoint, Stack,
    dns::DnsQueryType,
    udp::{PacketMetadata, UdpSocket},
};

const NTP_PORT: u16 = 123;
const NTP_LOCAL_PORT: u16 = 12_323;
const NTP_PACKET_LEN: usize = 48;
// LI=0, VN=3, Mode=3 (client).
const NTP_CLIENT_REQUEST: u8 = 0x1B;
const NTP_TO_UNIX_SECS: u32 = 2_208_988_800;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum SntpError {
    Dns,
    Bind,
    Send,
    Recv,
    ShortReply,
}

/// One SNTP round trip; returns Unix seconds from the server's transmit stamp.
pub(super) async fn query(stack: Stack<'_>, server: &str) -> Result<u64, SntpError> {
    let addresses = stack
        .dns_query(server, DnsQueryType::A)
        .await
        .map_err(|_| SntpError::Dns)?;
    let server = *addresses.first().ok_or(SntpError::Dns)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buffer = [0u8; 128];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_buffer = [0u8; 128];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(NTP_LOCAL_PORT).map_err(|_| SntpError::Bind)?;

    let mut request = [0u8; NTP_PACKET_LEN];
    request[0] = NTP_CLIENT_REQUEST;
    socket
        .send_to(&request, IpEndpoint::new(server, NTP_PORT))
        .await
        .map_err(|_| SntpError::Send)?;

    let mut reply = [0u8; 64];
    let (len, _) = socket
        .recv_from(&mut reply)
        .await
        .map_err(|_| SntpError::Recv)?;

    unix_from_reply(&reply[..len])
}

fn unix_from_reply(reply: &[u8]) -> Result<u64, SntpError> {
    if reply.len() < NTP_PACKET_LEN {
        return Err(SntpError::ShortReply);
    }
    let secs = u32::from_be_bytes([reply[40], reply[41], reply[42], reply[43]]);
    Ok(secs.wrapping_sub(NTP_TO_UNIX_SECS) as u64)
}
