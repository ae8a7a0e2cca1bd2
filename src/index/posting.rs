use crate::compression::vbyte::VByte;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// One entry of a term's inverted list: the term's occurrences in a
/// single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingRecord {
    pub doc_id: DocId,
    pub term_freq: u32,
    pub total_terms_in_doc: u32,
    /// Token position of the term's first occurrence. Meaningful only
    /// when the list was built with positions.
    pub first_position: u32,
}

/// Encoded posting list for one term.
///
/// Records are laid out in a single byte buffer, sorted by doc_id:
/// per record a delta-encoded doc_id (absolute for the first record)
/// followed by term_freq, total_terms_in_doc and first_position, all
/// varint. Cursors decode the buffer incrementally.
#[derive(Debug, Clone)]
pub struct PostingList {
    data: Vec<u8>,
    doc_count: u32,
    occurrence_total: u64,
    with_positions: bool,
}

impl PostingList {
    pub fn empty() -> Self {
        PostingList {
            data: Vec::new(),
            doc_count: 0,
            occurrence_total: 0,
            with_positions: false,
        }
    }

    /// Number of documents containing the term.
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Total occurrences of the term across all documents.
    pub fn occurrence_total(&self) -> u64 {
        self.occurrence_total
    }

    pub fn with_positions(&self) -> bool {
        self.with_positions
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode the whole list. Expensive; cursors are the normal path.
    pub fn decode_all(&self) -> Result<Vec<PostingRecord>> {
        let mut records = Vec::with_capacity(self.doc_count as usize);
        let mut pos = 0usize;
        let mut last_doc_id = 0u32;

        for i in 0..self.doc_count {
            let (record, consumed) =
                decode_record(&self.data[pos..], if i == 0 { None } else { Some(last_doc_id) })?;
            last_doc_id = record.doc_id.0;
            pos += consumed;
            records.push(record);
        }

        Ok(records)
    }
}

/// Decode one record at the start of `data`. `prev_doc_id` is `None`
/// for the first record of a list (absolute doc_id).
pub(crate) fn decode_record(
    data: &[u8],
    prev_doc_id: Option<u32>,
) -> Result<(PostingRecord, usize)> {
    let mut pos = 0usize;

    let (delta, n) = VByte::decode_u32(&data[pos..])?;
    pos += n;
    let doc_id = match prev_doc_id {
        Some(prev) => prev
            .checked_add(delta)
            .ok_or_else(|| Error::new(ErrorKind::Internal, "doc_id overflow".to_string()))?,
        None => delta,
    };

    let (term_freq, n) = VByte::decode_u32(&data[pos..])?;
    pos += n;
    let (total_terms_in_doc, n) = VByte::decode_u32(&data[pos..])?;
    pos += n;
    let (first_position, n) = VByte::decode_u32(&data[pos..])?;
    pos += n;

    Ok((
        PostingRecord {
            doc_id: DocId(doc_id),
            term_freq,
            total_terms_in_doc,
            first_position,
        },
        pos,
    ))
}

/// Accumulates records for one term; rejects out-of-order doc_ids.
pub struct PostingListBuilder {
    data: Vec<u8>,
    last_doc_id: Option<u32>,
    doc_count: u32,
    occurrence_total: u64,
    with_positions: bool,
}

impl PostingListBuilder {
    pub fn new(with_positions: bool) -> Self {
        PostingListBuilder {
            data: Vec::new(),
            last_doc_id: None,
            doc_count: 0,
            occurrence_total: 0,
            with_positions,
        }
    }

    pub fn push(&mut self, record: PostingRecord) -> Result<()> {
        let delta = match self.last_doc_id {
            Some(last) => {
                if record.doc_id.0 <= last {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("posting doc_id {} out of order", record.doc_id.0),
                    ));
                }
                record.doc_id.0 - last
            }
            None => record.doc_id.0,
        };

        VByte::encode_u32(&mut self.data, delta);
        VByte::encode_u32(&mut self.data, record.term_freq);
        VByte::encode_u32(&mut self.data, record.total_terms_in_doc);
        VByte::encode_u32(&mut self.data, record.first_position);

        self.last_doc_id = Some(record.doc_id.0);
        self.doc_count += 1;
        self.occurrence_total += record.term_freq as u64;
        Ok(())
    }

    pub fn build(self) -> PostingList {
        PostingList {
            data: self.data,
            doc_count: self.doc_count,
            occurrence_total: self.occurrence_total,
            with_positions: self.with_positions,
        }
    }
}
