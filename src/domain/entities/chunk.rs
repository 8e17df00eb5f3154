//! # Chunk Value Object
//!
//! ペイロードを固定長のチャンクに分割する

use crate::domain::errors::UploadError;

/// ペイロードの連続したバイト範囲 `[offset, offset + len)`
///
/// 一度切り出したら変更しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    index: usize,
    offset: usize,
    data: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// チャンクの順番（0始まり）
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// ペイロード先頭からのバイトオフセット
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 範囲の終端（排他的）
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// 必要なチャンク数（切り上げ）
pub fn chunk_count(payload_len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    payload_len.div_ceil(chunk_size)
}

/// ペイロードを `chunk_size` バイトごとに分割
///
/// 最後のチャンクのみ短くなりうる。同じ入力に対して常に同じ境界を返す
///
/// # Errors
///
/// ペイロードが空の場合は `EmptyPayload`、`chunk_size` が0の場合は `InvalidChunkSize`
pub fn split(payload: &[u8], chunk_size: usize) -> Result<Vec<Chunk<'_>>, UploadError> {
    if payload.is_empty() {
        return Err(UploadError::EmptyPayload);
    }
    if chunk_size == 0 {
        return Err(UploadError::InvalidChunkSize);
    }

    let mut chunks = Vec::with_capacity(chunk_count(payload.len(), chunk_size));
    chunks.extend(
        payload
            .chunks(chunk_size)
            .enumerate()
            .map(|(index, data)| Chunk {
                index,
                offset: index * chunk_size,
                data,
            }),
    );
    Ok(chunks)
}
