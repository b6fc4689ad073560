//! Protocol dispatch, template-cache maintenance, and cflowd transcoding.
//!
//! One `Decoder` is owned by a single port's worker thread; nothing about it is
//! `Sync`, since the template cache and sequence-tracking maps are single-writer
//! by construction (see the concurrency model).

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::{error, trace, warn};

use crate::cflowd::{self, ByteMovePlan, InputField};
use crate::flow::ipfix::{self, FieldType};
use crate::flow::netflow5;
use crate::template_cache::{EnterpriseBitConfig, Template, TemplateCache, TemplateKey};

#[derive(Debug, Clone, Copy)]
pub struct OutputFormats {
    pub cflowd: bool,
    pub ipfix: bool,
}

#[derive(Debug, Default)]
pub struct DecodeOutput {
    pub cflowd: Vec<u8>,
    pub raw_ipfix: Vec<u8>,
}

/// Dual flush thresholds for a decoder's per-format Q2 output accumulator.
pub const Q2_MAX_ITEMS: usize = 10_000;
pub const Q2_MAX_AGE: Duration = Duration::from_secs(10);

/// Buffers one output format's batches between Q1 reads, so the decoder puts
/// to Q2 in runs of up to `Q2_MAX_ITEMS` instead of one item at a time. Flushes
/// early if the oldest buffered item has aged past `Q2_MAX_AGE`.
#[derive(Default)]
pub struct OutputAccumulator {
    items: VecDeque<Vec<u8>>,
    oldest_inserted: Option<Instant>,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Vec<u8>) {
        if self.items.is_empty() {
            self.oldest_inserted = Some(Instant::now());
        }
        self.items.push_back(item);
    }

    pub fn should_flush(&self) -> bool {
        self.items.len() >= Q2_MAX_ITEMS || self.oldest_inserted.map_or(false, |t| t.elapsed() >= Q2_MAX_AGE)
    }

    /// How long until the age threshold fires, or `None` if there is nothing
    /// buffered and thus no pending deadline.
    pub fn time_until_flush(&self) -> Option<Duration> {
        self.oldest_inserted.map(|t| Q2_MAX_AGE.saturating_sub(t.elapsed()))
    }

    pub fn drain(&mut self) -> VecDeque<Vec<u8>> {
        self.oldest_inserted = None;
        std::mem::take(&mut self.items)
    }
}

#[derive(Debug, Default)]
struct SequenceState {
    expected_flow_id: u32,
}

pub struct Decoder {
    template_cache: TemplateCache,
    v5_plan: ByteMovePlan,
    v5_sequence: HashMap<(u32, u16), SequenceState>,
    formats: OutputFormats,
    log_missing_full: bool,
    log_unchanged_templates: bool,
}

/// The NetFlow v5 record's field layout, named so it can go through the same
/// byte-move planner as IPFIX templates. Computed once at Decoder construction
/// and shared by every v5 datagram this decoder ever sees.
#[rustfmt::skip]
fn v5_input_fields() -> Vec<InputField> {
    vec![
        InputField { name: "sourceIPv4Address",          in_offset: 0,  in_len: 4 },
        InputField { name: "destinationIPv4Address",     in_offset: 4,  in_len: 4 },
        InputField { name: "ipNextHopIPv4Address",       in_offset: 8,  in_len: 4 },
        InputField { name: "ingressInterface",           in_offset: 12, in_len: 2 },
        InputField { name: "egressInterface",            in_offset: 14, in_len: 2 },
        InputField { name: "packetDeltaCount",           in_offset: 16, in_len: 4 },
        InputField { name: "octetDeltaCount",            in_offset: 20, in_len: 4 },
        InputField { name: "sourceTransportPort",        in_offset: 32, in_len: 2 },
        InputField { name: "destinationTransportPort",   in_offset: 34, in_len: 2 },
        InputField { name: "tcpControlBits",             in_offset: 37, in_len: 1 },
        InputField { name: "protocolIdentifier",         in_offset: 38, in_len: 1 },
        InputField { name: "ipClassOfService",           in_offset: 39, in_len: 1 },
        InputField { name: "bgpSourceAsNumber",           in_offset: 40, in_len: 2 },
        InputField { name: "bgpDestinationAsNumber",      in_offset: 42, in_len: 2 },
        InputField { name: "sourceIPv4PrefixLength",      in_offset: 44, in_len: 1 },
        InputField { name: "destinationIPv4PrefixLength", in_offset: 45, in_len: 1 },
    ]
}

fn raw_field_value(template: &Template, record: &[u8], id: FieldType) -> Option<u64> {
    let field = template.field_list.iter().find(|f| f.id == id)?;
    if field.in_offset + field.length > record.len() || field.length > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - field.length..].copy_from_slice(&record[field.in_offset..field.in_offset + field.length]);
    Some(u64::from_be_bytes(buf))
}

impl Decoder {
    pub fn new(formats: OutputFormats, enterprise_bit: EnterpriseBitConfig, log_missing_full: bool, log_unchanged_templates: bool) -> Self {
        let v5_plan = cflowd::build_byte_move_plan(&v5_input_fields(), netflow5::DataSet::SIZE);
        Decoder {
            template_cache: TemplateCache::new(enterprise_bit),
            v5_plan,
            v5_sequence: HashMap::new(),
            formats,
            log_missing_full,
            log_unchanged_templates,
        }
    }

    pub fn decode_datagram(&mut self, peer_addr: Ipv4Addr, local_port: u16, buf: &[u8]) -> DecodeOutput {
        if buf.len() < 2 {
            trace!("dropping datagram shorter than a version field ({} bytes)", buf.len());
            return DecodeOutput::default();
        }

        match u16::from_be_bytes([buf[0], buf[1]]) {
            netflow5::VERSION => self.decode_v5(peer_addr, local_port, buf),
            ipfix::VERSION => self.decode_v10(peer_addr, local_port, buf),
            other => {
                warn!("dropping datagram from {} with unsupported version {}", peer_addr, other);
                DecodeOutput::default()
            }
        }
    }

    fn decode_v5(&mut self, peer_addr: Ipv4Addr, local_port: u16, buf: &[u8]) -> DecodeOutput {
        let mut out = DecodeOutput::default();

        let header = match netflow5::Header::read(buf) {
            Ok(h) => h,
            Err(e) => {
                warn!("dropping malformed NetFlow v5 datagram from {}: {}", peer_addr, e);
                return out;
            }
        };

        let needed = netflow5::Header::SIZE + header.count as usize * netflow5::DataSet::SIZE;
        if needed > buf.len() {
            warn!(
                "dropping NetFlow v5 datagram from {}: {} records need {} bytes but only {} received",
                peer_addr, header.count, needed, buf.len()
            );
            return out;
        }

        let exporter_addr_int: u32 = peer_addr.into();
        let state = self.v5_sequence.entry((exporter_addr_int, local_port)).or_default();
        let received = header.seq_number;
        if received > state.expected_flow_id && self.log_missing_full {
            error!(
                "missing flows from {}:{}: expected {}, got {}, lost {}",
                peer_addr,
                local_port,
                state.expected_flow_id,
                received,
                received - state.expected_flow_id
            );
        }
        state.expected_flow_id = received.wrapping_add(header.count as u32);

        if !self.formats.cflowd {
            return out;
        }

        let record_buf = &buf[netflow5::Header::SIZE..needed];
        let mut output = vec![0u8; header.count as usize * cflowd::RECORD_SIZE];
        self.v5_plan.apply(record_buf, &mut output, header.count as usize);

        for i in 0..header.count as usize {
            let rec_buf = &record_buf[i * netflow5::DataSet::SIZE..(i + 1) * netflow5::DataSet::SIZE];
            let record = netflow5::DataSet::read(rec_buf).expect("length already validated above");
            let out_base = i * cflowd::RECORD_SIZE;

            let flow_id = received.wrapping_add(i as u32);
            output[out_base..out_base + 4].copy_from_slice(&flow_id.to_le_bytes());
            output[out_base + 4..out_base + 8].copy_from_slice(&exporter_addr_int.to_le_bytes());

            let start_s = (header.unix_secs as i64 - (header.uptime as i64 - record.start_time as i64) / 1000) as u32;
            let end_s = (header.unix_secs as i64 - (header.uptime as i64 - record.end_time as i64) / 1000) as u32;
            output[out_base + 36..out_base + 40].copy_from_slice(&start_s.to_le_bytes());
            output[out_base + 40..out_base + 44].copy_from_slice(&end_s.to_le_bytes());
        }

        out.cflowd = output;
        out
    }

    fn decode_v10(&mut self, peer_addr: Ipv4Addr, local_port: u16, buf: &[u8]) -> DecodeOutput {
        let mut out = DecodeOutput::default();

        let header = match ipfix::Header::read(buf) {
            Ok(h) => h,
            Err(e) => {
                warn!("dropping malformed IPFIX datagram from {}: {}", peer_addr, e);
                return out;
            }
        };

        if header.length as usize > buf.len() {
            warn!(
                "dropping IPFIX datagram from {}: declared length {} exceeds received {}",
                peer_addr,
                header.length,
                buf.len()
            );
            return out;
        }

        let mut offset = ipfix::Header::SIZE;
        let mut record_index: u32 = 0;
        let mut cflowd_records = Vec::new();

        while offset + ipfix::SetHeader::SIZE <= buf.len() {
            let set_header = match ipfix::SetHeader::read(&buf[offset..]) {
                Ok(h) => h,
                Err(e) => {
                    warn!("stopping IPFIX set walk from {}: {}", peer_addr, e);
                    break;
                }
            };

            let set_len = set_header.length as usize;
            if set_len < ipfix::SetHeader::SIZE || offset + set_len > buf.len() {
                warn!("stopping IPFIX set walk from {}: invalid set length {} at offset {}", peer_addr, set_len, offset);
                break;
            }

            let whole_set = &buf[offset..offset + set_len];
            let set_body = &whole_set[ipfix::SetHeader::SIZE..];

            match set_header.id {
                ipfix::DataSetTemplate::SET_ID => {
                    self.handle_template_set(peer_addr, local_port, header.domain_id, set_body, whole_set, &mut out.raw_ipfix);
                }
                ipfix::OptionDataSetTemplate::SET_ID => {
                    self.handle_option_template_set(peer_addr, local_port, header.domain_id, set_body, whole_set, &mut out.raw_ipfix);
                }
                id if id >= ipfix::MIN_SET_ID => {
                    self.handle_data_set(peer_addr, local_port, header.domain_id, id, header.seq_number, set_body, whole_set, &mut record_index, &mut cflowd_records, &mut out.raw_ipfix);
                }
                _ => trace!("skipping reserved IPFIX set id {} from {}", set_header.id, peer_addr),
            }

            offset += set_len;
        }

        if self.formats.cflowd {
            out.cflowd = cflowd_records;
        }
        out
    }

    fn handle_template_set(&mut self, peer_addr: Ipv4Addr, local_port: u16, domain_id: u32, mut buf: &[u8], whole_set: &[u8], raw_out: &mut Vec<u8>) {
        let exporter_addr_int: u32 = peer_addr.into();
        let mut any_new = false;

        while buf.len() >= ipfix::TemplateHeader::SIZE {
            let (parsed, consumed) = match ipfix::DataSetTemplate::read(buf) {
                Ok(v) => v,
                Err(_) => break, // trailing zero padding shorter than a descriptor
            };

            let key = TemplateKey { exporter_addr: exporter_addr_int, local_port, observation_domain_id: domain_id, template_id: parsed.header.id };
            any_new |= self.template_cache.install_data_template(key, buf, &parsed, self.log_unchanged_templates);
            buf = &buf[consumed..];
        }

        if any_new && self.formats.ipfix {
            raw_out.extend_from_slice(whole_set);
        }
    }

    fn handle_option_template_set(&mut self, peer_addr: Ipv4Addr, local_port: u16, domain_id: u32, mut buf: &[u8], whole_set: &[u8], raw_out: &mut Vec<u8>) {
        let exporter_addr_int: u32 = peer_addr.into();
        let mut any_new = false;

        while buf.len() >= ipfix::OptionTemplateHeader::SIZE {
            let (parsed, consumed) = match ipfix::OptionDataSetTemplate::read(buf) {
                Ok(v) => v,
                Err(_) => break,
            };

            let key = TemplateKey { exporter_addr: exporter_addr_int, local_port, observation_domain_id: domain_id, template_id: parsed.header.id };
            any_new |= self.template_cache.install_option_template(key, buf, &parsed, self.log_unchanged_templates);
            buf = &buf[consumed..];
        }

        if any_new && self.formats.ipfix {
            raw_out.extend_from_slice(whole_set);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_data_set(
        &mut self,
        peer_addr: Ipv4Addr,
        local_port: u16,
        domain_id: u32,
        set_id: u16,
        seq_number: u32,
        buf: &[u8],
        whole_set: &[u8],
        record_index: &mut u32,
        cflowd_records: &mut Vec<u8>,
        raw_out: &mut Vec<u8>,
    ) {
        let exporter_addr_int: u32 = peer_addr.into();
        let key = TemplateKey { exporter_addr: exporter_addr_int, local_port, observation_domain_id: domain_id, template_id: set_id };

        let is_option = match self.template_cache.get(&key) {
            Some(t) => t.is_option,
            None => {
                if self.template_cache.note_unknown(key) {
                    error!("template {:?} not yet defined, dropping data set", key);
                }
                if self.formats.ipfix {
                    raw_out.extend_from_slice(whole_set);
                }
                return;
            }
        };

        if self.formats.ipfix {
            raw_out.extend_from_slice(whole_set);
        }

        if is_option {
            return;
        }

        let record_size = self.template_cache.get(&key).map(|t| t.input_record_size).unwrap_or(0);
        if record_size == 0 || buf.len() < record_size {
            return;
        }
        let count = buf.len() / record_size;

        if let Some(template) = self.template_cache.get_mut(&key) {
            if seq_number > template.last_flow_info.expected_flow_id && self.log_missing_full {
                error!(
                    "missing flows for template {:?}: expected {}, got {}, lost {}",
                    key,
                    template.last_flow_info.expected_flow_id,
                    seq_number,
                    seq_number - template.last_flow_info.expected_flow_id
                );
            }
            template.last_flow_info.expected_flow_id = seq_number.wrapping_add(count as u32);
        }

        if !self.formats.cflowd {
            *record_index += count as u32;
            return;
        }

        let template = match self.template_cache.get_mut(&key) {
            Some(t) => t,
            None => return,
        };

        if !template.cflowd_compat {
            *record_index += count as u32;
            return;
        }

        let mut output = vec![0u8; count * cflowd::RECORD_SIZE];
        template.byte_move_plan.apply(buf, &mut output, count);

        for i in 0..count {
            let record = &buf[i * record_size..(i + 1) * record_size];
            template.check_data_loss(&key, record);

            let out_base = i * cflowd::RECORD_SIZE;
            let flow_id = seq_number.wrapping_add(*record_index);
            *record_index += 1;
            output[out_base..out_base + 4].copy_from_slice(&flow_id.to_le_bytes());
            output[out_base + 4..out_base + 8].copy_from_slice(&exporter_addr_int.to_le_bytes());

            let start_ms = raw_field_value(template, record, FieldType::FlowStartMilliseconds);
            let end_ms = raw_field_value(template, record, FieldType::FlowEndMilliseconds);
            if let (Some(start_ms), Some(end_ms)) = (start_ms, end_ms) {
                let start_s = (start_ms / 1000) as u32;
                let end_s = (end_ms / 1000) as u32;
                output[out_base + 36..out_base + 40].copy_from_slice(&start_s.to_le_bytes());
                output[out_base + 40..out_base + 44].copy_from_slice(&end_s.to_le_bytes());
            }
        }

        cflowd_records.extend_from_slice(&output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats_cflowd_only() -> OutputFormats {
        OutputFormats { cflowd: true, ipfix: false }
    }

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }

    fn build_v5_datagram(seq: u32, records: &[(u32, u32, u32, u32, u32)]) -> Vec<u8> {
        // records: (src, dst, next_hop, start_up, end_up)
        let mut buf = Vec::new();
        push_u16(&mut buf, 5); // version
        push_u16(&mut buf, records.len() as u16); // count
        push_u32(&mut buf, 1000); // uptime ms
        push_u32(&mut buf, 1_700_000_000); // unix secs
        push_u32(&mut buf, 0); // unix nsecs
        push_u32(&mut buf, seq); // sequence
        buf.push(1); // engine type
        buf.push(0); // engine id
        push_u16(&mut buf, 0); // sampling

        for (src, dst, next_hop, start_up, end_up) in records {
            push_u32(&mut buf, *src);
            push_u32(&mut buf, *dst);
            push_u32(&mut buf, *next_hop);
            push_u16(&mut buf, 1); // input_int
            push_u16(&mut buf, 2); // output_int
            push_u32(&mut buf, 1000); // packets
            push_u32(&mut buf, 10000); // octets
            push_u32(&mut buf, *start_up);
            push_u32(&mut buf, *end_up);
            push_u16(&mut buf, 22); // src port
            push_u16(&mut buf, 22); // dst port
            buf.push(0); // pad1
            buf.push(0xff); // tcp flags
            buf.push(6); // protocol
            buf.push(0); // tos
            push_u16(&mut buf, 3); // src as
            push_u16(&mut buf, 3); // dst as
            buf.push(24); // src mask
            buf.push(24); // dst mask
            push_u16(&mut buf, 0); // pad2
        }

        buf
    }

    #[test]
    fn v5_single_datagram_two_records() {
        let mut decoder = Decoder::new(formats_cflowd_only(), EnterpriseBitConfig::default(), false, false);
        let datagram = build_v5_datagram(1, &[(0x80af0221, 0x80af0223, 0x80af0222, 0, 1000), (0x80af0221, 0x80af0223, 0x80af0222, 0, 1000)]);

        let peer: Ipv4Addr = "10.0.0.1".parse().unwrap();
        let out = decoder.decode_datagram(peer, 9999, &datagram);

        assert_eq!(out.cflowd.len(), 2 * cflowd::RECORD_SIZE);

        let flow_id_0 = u32::from_le_bytes(out.cflowd[0..4].try_into().unwrap());
        let flow_id_1 = u32::from_le_bytes(out.cflowd[cflowd::RECORD_SIZE..cflowd::RECORD_SIZE + 4].try_into().unwrap());
        assert_eq!(flow_id_0, 1);
        assert_eq!(flow_id_1, 2);

        let start_s = u32::from_le_bytes(out.cflowd[36..40].try_into().unwrap());
        let end_s = u32::from_le_bytes(out.cflowd[40..44].try_into().unwrap());
        assert_eq!(start_s, 1_699_999_999);
        assert_eq!(end_s, 1_700_000_000);

        let exporter = u32::from_le_bytes(out.cflowd[4..8].try_into().unwrap());
        assert_eq!(exporter, u32::from(peer));
    }

    #[test]
    fn v5_sequence_gap_is_logged_only_when_requested_but_records_always_pass_through() {
        let peer: Ipv4Addr = "10.0.0.2".parse().unwrap();

        let mut quiet = Decoder::new(formats_cflowd_only(), EnterpriseBitConfig::default(), false, false);
        let first = build_v5_datagram(1, &[(1, 2, 3, 0, 0); 10]);
        let second = build_v5_datagram(15, &[(1, 2, 3, 0, 0); 10]);

        let out1 = quiet.decode_datagram(peer, 9999, &first);
        let out2 = quiet.decode_datagram(peer, 9999, &second);
        assert_eq!(out1.cflowd.len(), 10 * cflowd::RECORD_SIZE);
        assert_eq!(out2.cflowd.len(), 10 * cflowd::RECORD_SIZE);

        let mut verbose = Decoder::new(formats_cflowd_only(), EnterpriseBitConfig::default(), true, false);
        verbose.decode_datagram(peer, 9999, &first);
        verbose.decode_datagram(peer, 9999, &second); // only log output differs, not observable here
    }

    #[test]
    fn short_datagram_is_dropped_silently() {
        let mut decoder = Decoder::new(formats_cflowd_only(), EnterpriseBitConfig::default(), false, false);
        let peer: Ipv4Addr = "10.0.0.3".parse().unwrap();
        let out = decoder.decode_datagram(peer, 9999, &[0x05]);
        assert!(out.cflowd.is_empty());
    }

    fn push_template_header(buf: &mut Vec<u8>, id: u16, field_count: u16) {
        push_u16(buf, id);
        push_u16(buf, field_count);
    }
    fn push_field(buf: &mut Vec<u8>, id: u16, length: u16) {
        push_u16(buf, id);
        push_u16(buf, length);
    }

    fn v10_template_with_cflowd_fields() -> Vec<u8> {
        let mut t = Vec::new();
        push_template_header(&mut t, 256, 6);
        push_field(&mut t, 8, 4); // sourceIPv4Address
        push_field(&mut t, 12, 4); // destinationIPv4Address
        push_field(&mut t, 2, 8); // packetDeltaCount
        push_field(&mut t, 1, 8); // octetDeltaCount
        push_field(&mut t, 152, 8); // flowStartMilliseconds
        push_field(&mut t, 153, 8); // flowEndMilliseconds
        t
    }

    fn v10_data_record(src: u32, dst: u32, packets: u64, octets: u64, start_ms: u64, end_ms: u64) -> Vec<u8> {
        let mut d = Vec::new();
        push_u32(&mut d, src);
        push_u32(&mut d, dst);
        d.extend_from_slice(&packets.to_be_bytes());
        d.extend_from_slice(&octets.to_be_bytes());
        d.extend_from_slice(&start_ms.to_be_bytes());
        d.extend_from_slice(&end_ms.to_be_bytes());
        d
    }

    fn wrap_set(set_id: u16, body: &[u8]) -> Vec<u8> {
        let mut s = Vec::new();
        push_u16(&mut s, set_id);
        push_u16(&mut s, (4 + body.len()) as u16);
        s.extend_from_slice(body);
        s
    }

    fn wrap_message(seq: u32, domain_id: u32, sets: &[Vec<u8>]) -> Vec<u8> {
        let mut m = Vec::new();
        let total_len: usize = 16 + sets.iter().map(|s| s.len()).sum::<usize>();
        push_u16(&mut m, 10); // version
        push_u16(&mut m, total_len as u16);
        push_u32(&mut m, 1_700_000_000); // export time
        push_u32(&mut m, seq);
        push_u32(&mut m, domain_id);
        for s in sets {
            m.extend_from_slice(s);
        }
        m
    }

    #[test]
    fn v10_template_install_then_data_set_produces_cflowd() {
        let mut decoder = Decoder::new(OutputFormats { cflowd: true, ipfix: true }, EnterpriseBitConfig::default(), false, false);
        let peer: Ipv4Addr = "10.0.0.4".parse().unwrap();

        let template_msg = wrap_message(1, 0, &[wrap_set(ipfix::DataSetTemplate::SET_ID, &v10_template_with_cflowd_fields())]);
        let out1 = decoder.decode_datagram(peer, 9999, &template_msg);
        assert!(out1.cflowd.is_empty());
        assert!(!out1.raw_ipfix.is_empty(), "newly installed template set should be passed through raw");

        let record = v10_data_record(0x0a000002, 0x0a000003, 10, 2000, 1_700_000_000_000, 1_700_000_001_000);
        let data_msg = wrap_message(2, 0, &[wrap_set(256, &record)]);
        let out2 = decoder.decode_datagram(peer, 9999, &data_msg);

        assert_eq!(out2.cflowd.len(), cflowd::RECORD_SIZE);
        let start_s = u32::from_le_bytes(out2.cflowd[36..40].try_into().unwrap());
        let end_s = u32::from_le_bytes(out2.cflowd[40..44].try_into().unwrap());
        assert_eq!(start_s, 1_700_000_000);
        assert_eq!(end_s, 1_700_000_001);
    }

    #[test]
    fn v10_unknown_template_drops_data_set_without_cflowd_output() {
        let mut decoder = Decoder::new(OutputFormats { cflowd: true, ipfix: false }, EnterpriseBitConfig::default(), false, false);
        let peer: Ipv4Addr = "10.0.0.5".parse().unwrap();

        let record = v10_data_record(1, 2, 1, 1, 0, 0);
        let data_msg = wrap_message(1, 0, &[wrap_set(300, &record)]);
        let out = decoder.decode_datagram(peer, 9999, &data_msg);

        assert!(out.cflowd.is_empty());
    }

    #[test]
    fn accumulator_flushes_on_item_count() {
        let mut acc = OutputAccumulator::new();
        for _ in 0..Q2_MAX_ITEMS - 1 {
            acc.push(vec![0u8]);
        }
        assert!(!acc.should_flush());

        acc.push(vec![0u8]);
        assert!(acc.should_flush());

        let drained = acc.drain();
        assert_eq!(drained.len(), Q2_MAX_ITEMS);
        assert!(!acc.should_flush());
        assert!(acc.time_until_flush().is_none());
    }

    #[test]
    fn accumulator_reports_no_deadline_when_empty() {
        let acc = OutputAccumulator::new();
        assert!(acc.time_until_flush().is_none());
        assert!(!acc.should_flush());
    }

    #[test]
    fn accumulator_deadline_counts_down_from_first_push() {
        let mut acc = OutputAccumulator::new();
        acc.push(vec![1, 2, 3]);

        let remaining = acc.time_until_flush().expect("deadline set after first push");
        assert!(remaining <= Q2_MAX_AGE);
    }
}
