use byteorder::ByteOrder;

use crate::config::DecodeConfig;
use crate::cursor::PayloadCursor;
use crate::error::PayloadOverrun;
use crate::types::SampleFormat;

/// The identity trailer (`struct sample_id`) that follows the fixed fields of
/// non-sample records when `sample_id_all` is set.
///
/// ```c
/// struct sample_id {
///     { u32 pid, tid; }   /* if PERF_SAMPLE_TID set */
///     { u64 time;     }   /* if PERF_SAMPLE_TIME set */
///     { u64 id;       }   /* if PERF_SAMPLE_ID set */
///     { u64 stream_id;}   /* if PERF_SAMPLE_STREAM_ID set  */
///     { u32 cpu, res; }   /* if PERF_SAMPLE_CPU set */
///     { u64 id;       }   /* if PERF_SAMPLE_IDENTIFIER set */
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleId {
    pub pid: Option<u32>,
    pub tid: Option<u32>,
    pub time: Option<u64>,
    /// From `PERF_SAMPLE_ID`, or from the identifier duplicate if only that
    /// is present.
    pub id: Option<u64>,
    pub stream_id: Option<u64>,
    pub cpu: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleIdField {
    Tid,
    Time,
    Id,
    StreamId,
    Cpu,
    Identifier,
}

/// The trailer fields in ABI order, with their gating bit and byte width.
pub(crate) const SAMPLE_ID_FIELDS: &[(SampleFormat, SampleIdField, usize)] = &[
    (SampleFormat::TID, SampleIdField::Tid, 8),
    (SampleFormat::TIME, SampleIdField::Time, 8),
    (SampleFormat::ID, SampleIdField::Id, 8),
    (SampleFormat::STREAM_ID, SampleIdField::StreamId, 8),
    (SampleFormat::CPU, SampleIdField::Cpu, 8),
    (SampleFormat::IDENTIFIER, SampleIdField::Identifier, 8),
];

impl SampleId {
    /// The number of bytes the trailer occupies under `config`.
    pub fn encoded_len(config: &DecodeConfig) -> usize {
        let format = config.layout_format();
        SAMPLE_ID_FIELDS
            .iter()
            .filter(|(bit, _, _)| format.contains(*bit))
            .map(|(_, _, width)| width)
            .sum()
    }

    /// Parses a trailer from the start of `data`, returning it together with
    /// the number of bytes consumed.
    pub fn parse<T: ByteOrder>(
        data: &[u8],
        config: &DecodeConfig,
    ) -> Result<(Self, usize), PayloadOverrun> {
        let mut cur = PayloadCursor::<T>::new(data);
        let sample_id = Self::parse_from(&mut cur, config)?;
        Ok((sample_id, cur.position()))
    }

    pub(crate) fn parse_from<T: ByteOrder>(
        cur: &mut PayloadCursor<T>,
        config: &DecodeConfig,
    ) -> Result<Self, PayloadOverrun> {
        let format = config.layout_format();
        let mut sample_id = SampleId::default();
        for &(bit, field, _) in SAMPLE_ID_FIELDS {
            if !format.contains(bit) {
                continue;
            }
            match field {
                SampleIdField::Tid => {
                    sample_id.pid = Some(cur.read_u32()?);
                    sample_id.tid = Some(cur.read_u32()?);
                }
                SampleIdField::Time => sample_id.time = Some(cur.read_u64()?),
                SampleIdField::Id => sample_id.id = Some(cur.read_u64()?),
                SampleIdField::StreamId => sample_id.stream_id = Some(cur.read_u64()?),
                SampleIdField::Cpu => {
                    sample_id.cpu = Some(cur.read_u32()?);
                    let _reserved = cur.read_u32()?;
                }
                SampleIdField::Identifier => {
                    let identifier = cur.read_u64()?;
                    sample_id.id.get_or_insert(identifier);
                }
            }
        }
        Ok(sample_id)
    }

    /// Splits a non-sample payload into its body and its trailer.
    ///
    /// The trailer is taken from the end of the payload, which is where the
    /// kernel puts it even when it adds fields the decoder does not know
    /// about. The body must hold at least `fixed_len` bytes.
    pub(crate) fn split_trailer<'a, T: ByteOrder>(
        payload: &'a [u8],
        fixed_len: usize,
        config: &DecodeConfig,
    ) -> Result<(PayloadCursor<'a, T>, Option<SampleId>), PayloadOverrun> {
        if !config.sample_id_all() {
            if payload.len() < fixed_len {
                return Err(PayloadOverrun {
                    needed: fixed_len,
                    available: payload.len(),
                });
            }
            return Ok((PayloadCursor::new(payload), None));
        }
        let trailer_len = Self::encoded_len(config);
        let body_len = payload
            .len()
            .checked_sub(trailer_len)
            .filter(|&len| len >= fixed_len)
            .ok_or(PayloadOverrun {
                needed: fixed_len + trailer_len,
                available: payload.len(),
            })?;
        let (body, trailer) = payload.split_at(body_len);
        let (sample_id, _) = Self::parse::<T>(trailer, config)?;
        Ok((PayloadCursor::new(body), Some(sample_id)))
    }
}
