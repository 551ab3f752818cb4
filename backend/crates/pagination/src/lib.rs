//! Opaque cursor and page envelope primitives shared by list endpoints.
//!
//! Cursors are URL-safe base64 encodings of a small versioned JSON payload so
//! clients treat them as opaque tokens. Adapters fetch `limit + 1` rows and
//! hand the window to [`Page::from_window`], which trims the overflow row and
//! emits the cursor for the next page.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: usize = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: usize = 100;

const CURSOR_VERSION: u8 = 1;

/// Errors raised while parsing pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Requested page size is zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit {
        /// Limit supplied by the client.
        limit: usize,
        /// Maximum accepted limit.
        max: usize,
    },
    /// Cursor could not be decoded.
    #[error("cursor is invalid: {reason}")]
    InvalidCursor {
        /// Why decoding failed.
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    v: u8,
    o: usize,
}

/// Position within an ordered listing.
///
/// # Examples
/// ```
/// use pagination::Cursor;
///
/// let cursor = Cursor::at(40);
/// let decoded = Cursor::decode(&cursor.encode()).expect("round trip");
/// assert_eq!(decoded.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    /// Cursor pointing at the first item.
    #[must_use]
    pub const fn start() -> Self {
        Self { offset: 0 }
    }

    /// Cursor pointing at `offset` items into the listing.
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self { offset }
    }

    /// Number of items skipped before this cursor.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Encode the cursor as an opaque URL-safe token.
    #[must_use]
    pub fn encode(self) -> String {
        let payload = CursorPayload {
            v: CURSOR_VERSION,
            o: self.offset,
        };
        // Serialising a two-field struct of integers cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`PaginationError::InvalidCursor`] when the token is not valid
    /// base64, not the expected JSON shape, or carries an unknown version.
    pub fn decode(raw: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.trim())
            .map_err(|err| PaginationError::InvalidCursor {
                reason: err.to_string(),
            })?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|err| PaginationError::InvalidCursor {
                reason: err.to_string(),
            })?;
        if payload.v != CURSOR_VERSION {
            return Err(PaginationError::InvalidCursor {
                reason: format!("unsupported cursor version {}", payload.v),
            });
        }
        Ok(Self::at(payload.o))
    }
}

/// Validated page request derived from `limit` and `cursor` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    cursor: Cursor,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor: Cursor::start(),
        }
    }
}

impl PageRequest {
    /// Parse raw query values.
    ///
    /// # Errors
    /// Returns [`PaginationError`] when the limit is out of range or the
    /// cursor cannot be decoded.
    pub fn new(limit: Option<usize>, cursor: Option<&str>) -> Result<Self, PaginationError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PaginationError::InvalidLimit {
                limit,
                max: MAX_LIMIT,
            });
        }
        let cursor = match cursor {
            Some(raw) if !raw.trim().is_empty() => Cursor::decode(raw)?,
            _ => Cursor::start(),
        };
        Ok(Self { limit, cursor })
    }

    /// First page with the given limit, clamped into the accepted range.
    #[must_use]
    pub fn first(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            cursor: Cursor::start(),
        }
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.cursor.offset()
    }

    /// Number of rows adapters should fetch to detect a following page.
    #[must_use]
    pub const fn fetch_size(&self) -> usize {
        self.limit.saturating_add(1)
    }
}

/// Page envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Cursor for the following page, absent on the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from a window of at most `request.fetch_size()` items
    /// starting at `request.offset()`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let request = PageRequest::first(2);
    /// let page = Page::from_window(vec![1, 2, 3], &request);
    /// assert_eq!(page.data, vec![1, 2]);
    /// assert!(page.next_cursor.is_some());
    /// ```
    #[must_use]
    pub fn from_window(mut items: Vec<T>, request: &PageRequest) -> Self {
        let has_more = items.len() > request.limit();
        items.truncate(request.limit());
        let next_cursor = has_more
            .then(|| Cursor::at(request.offset().saturating_add(request.limit())).encode());
        Self {
            data: items,
            next_cursor,
        }
    }

    /// Slice a fully materialised listing into the requested page.
    #[must_use]
    pub fn paginate(items: Vec<T>, request: &PageRequest) -> Self {
        let window = items
            .into_iter()
            .skip(request.offset())
            .take(request.fetch_size())
            .collect();
        Self::from_window(window, request)
    }

    /// Transform each item while keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
