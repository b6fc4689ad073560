//! The fixed-width "cflowd" output record and the byte-move-plan compiler that
//! transcodes NetFlow v5 records and IPFIX data records into it.

pub const RECORD_SIZE: usize = 57;

/// One field of the fixed cflowd record layout. `name` is the join key the byte-move
/// planner uses to line up an input wire field with its cflowd destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CflowdField {
    pub name: &'static str,
    pub offset: usize,
    pub length: usize,
}

#[rustfmt::skip]
pub const FIELDS: &[CflowdField] = &[
    CflowdField { name: "flowId",                    offset: 0,  length: 4 },
    CflowdField { name: "exporterIPv4Address",        offset: 4,  length: 4 },
    CflowdField { name: "sourceIPv4Address",          offset: 8,  length: 4 },
    CflowdField { name: "destinationIPv4Address",     offset: 12, length: 4 },
    CflowdField { name: "ingressInterface",           offset: 16, length: 2 },
    CflowdField { name: "egressInterface",            offset: 18, length: 2 },
    CflowdField { name: "sourceTransportPort",        offset: 20, length: 2 },
    CflowdField { name: "destinationTransportPort",   offset: 22, length: 2 },
    CflowdField { name: "packetDeltaCount",           offset: 24, length: 4 },
    CflowdField { name: "octetDeltaCount",            offset: 28, length: 4 },
    CflowdField { name: "ipNextHopIPv4Address",       offset: 32, length: 4 },
    CflowdField { name: "flowStartSeconds",           offset: 36, length: 4 },
    CflowdField { name: "flowEndSeconds",             offset: 40, length: 4 },
    CflowdField { name: "protocolIdentifier",         offset: 44, length: 1 },
    CflowdField { name: "ipClassOfService",           offset: 45, length: 1 },
    CflowdField { name: "bgpSourceAsNumber",           offset: 46, length: 2 },
    CflowdField { name: "bgpDestinationAsNumber",      offset: 48, length: 2 },
    CflowdField { name: "sourceIPv4PrefixLength",      offset: 50, length: 1 },
    CflowdField { name: "destinationIPv4PrefixLength", offset: 51, length: 1 },
    CflowdField { name: "tcpControlBits",             offset: 52, length: 1 },
    // offset 53..55: paddingOctets[2], left zero.
];

pub fn field_by_name(name: &str) -> Option<&'static CflowdField> {
    FIELDS.iter().find(|f| f.name == name)
}

/// A single input field as the byte-move planner needs to see it: a name that may
/// match a cflowd field, its offset within one input record, and its wire width.
#[derive(Debug, Clone, Copy)]
pub struct InputField {
    pub name: &'static str,
    pub in_offset: usize,
    pub in_len: usize,
}

/// A precomputed pair of integer vectors implementing endianness swap + field
/// reorder + truncation from one input record layout to the cflowd layout.
/// Immutable once built; installing a changed template produces a new plan rather
/// than mutating this one.
#[derive(Debug, Clone, Default)]
pub struct ByteMovePlan {
    pub in_idx: Vec<usize>,
    pub out_idx: Vec<usize>,
    /// Input byte offsets that must be zero; a non-zero byte here means a wire
    /// field was wider than its cflowd destination and data is being discarded.
    pub check_for_zero: Vec<usize>,
    pub input_record_size: usize,
}

impl ByteMovePlan {
    /// Applies the plan to `cnt` consecutive input records, writing `cnt` 57-byte
    /// cflowd records into `output` (which must already be zeroed: short input
    /// fields rely on the output buffer's own zero-initialization).
    pub fn apply(&self, input: &[u8], output: &mut [u8], cnt: usize) {
        for rec in 0..cnt {
            let in_base = rec * self.input_record_size;
            let out_base = rec * RECORD_SIZE;
            for k in 0..self.in_idx.len() {
                output[out_base + self.out_idx[k]] = input[in_base + self.in_idx[k]];
            }
        }
    }

    /// Returns the first offset (relative to one input record) that is expected to
    /// be zero but isn't, for the given record's input slice.
    pub fn find_non_zero(&self, record: &[u8]) -> Option<usize> {
        self.check_for_zero.iter().copied().find(|&off| record.get(off).copied().unwrap_or(0) != 0)
    }
}

/// Builds a byte-move plan mapping `input_fields` (in the order they appear on the
/// wire) onto the fixed cflowd layout. Input fields whose name has no cflowd
/// counterpart are simply not represented in the plan -- their bytes are never
/// read.
pub fn build_byte_move_plan(input_fields: &[InputField], input_record_size: usize) -> ByteMovePlan {
    let mut plan = ByteMovePlan { input_record_size, ..Default::default() };

    for field in input_fields {
        let cflowd_field = match field_by_name(field.name) {
            Some(f) => f,
            None => continue,
        };

        let eff = field.in_len.min(cflowd_field.length);

        for k in 0..eff {
            // Reverse the input byte order (network big-endian) against the
            // forward output order (host little-endian cflowd); the tail
            // `eff` bytes of the input field are the ones kept on truncation,
            // since they are its least-significant bytes.
            plan.in_idx.push(field.in_offset + field.in_len - 1 - k);
            plan.out_idx.push(cflowd_field.offset + k);
        }

        if field.in_len > cflowd_field.length {
            for extra in 0..(field.in_len - cflowd_field.length) {
                plan.check_for_zero.push(field.in_offset + extra);
            }
        }
    }

    plan
}

/// True only if the cflowd-compatibility gate is satisfied: both millisecond
/// timestamp fields are present among `field_names`.
pub fn is_cflowd_compat<'a, I: IntoIterator<Item = &'a str>>(field_names: I) -> bool {
    let mut has_start = false;
    let mut has_end = false;
    for name in field_names {
        match name {
            "flowStartMilliseconds" => has_start = true,
            "flowEndMilliseconds" => has_end = true,
            _ => {}
        }
    }
    has_start && has_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_reverses_multi_byte_fields() {
        // sourceIPv4Address: cflowd offset 8, width 4. One input record with a
        // single 4-byte big-endian field at offset 0.
        let input_fields = [InputField { name: "sourceIPv4Address", in_offset: 0, in_len: 4 }];
        let plan = build_byte_move_plan(&input_fields, 4);

        let input = [0x01u8, 0x02, 0x03, 0x04];
        let mut output = [0u8; RECORD_SIZE];
        plan.apply(&input, &mut output, 1);

        assert_eq!(&output[8..12], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn plan_truncates_wide_input_and_records_check_for_zero() {
        // octetDeltaCount is 4 bytes in cflowd but IPFIX often carries it as an
        // 8-byte counter; the top 4 bytes must be zero or data is being lost.
        let input_fields = [InputField { name: "octetDeltaCount", in_offset: 0, in_len: 8 }];
        let plan = build_byte_move_plan(&input_fields, 8);

        assert_eq!(plan.check_for_zero, vec![0, 1, 2, 3]);

        let input = [0u8, 0, 0, 0, 0x00, 0x00, 0x27, 0x10]; // 10000 in the low 4 bytes
        let mut output = [0u8; RECORD_SIZE];
        plan.apply(&input, &mut output, 1);

        assert_eq!(&output[28..32], &[0x10, 0x27, 0x00, 0x00]);
        assert_eq!(plan.find_non_zero(&input), None);
    }

    #[test]
    fn plan_flags_non_zero_high_bytes_as_data_loss() {
        let input_fields = [InputField { name: "octetDeltaCount", in_offset: 0, in_len: 8 }];
        let plan = build_byte_move_plan(&input_fields, 8);

        let input = [0u8, 0, 0, 1, 0, 0, 0, 1];
        assert_eq!(plan.find_non_zero(&input), Some(3));
    }

    #[test]
    fn plan_skips_fields_with_no_cflowd_counterpart() {
        let input_fields = [InputField { name: "somethingUnrelated", in_offset: 0, in_len: 4 }];
        let plan = build_byte_move_plan(&input_fields, 4);

        assert!(plan.in_idx.is_empty());
        assert!(plan.out_idx.is_empty());
    }

    #[test]
    fn cflowd_compat_requires_both_millisecond_timestamps() {
        assert!(is_cflowd_compat(vec!["flowStartMilliseconds", "flowEndMilliseconds", "sourceIPv4Address"]));
        assert!(!is_cflowd_compat(vec!["flowStartMilliseconds", "sourceIPv4Address"]));
        assert!(!is_cflowd_compat(Vec::<&str>::new()));
    }
}
