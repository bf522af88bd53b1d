//! Pagination policy for the book list
//!
//! The list endpoint reads one fixed-size window of the collection sorted by
//! title. The requested page is parsed leniently, with the same rules as
//! JavaScript's `parseInt`: anything that does not start with an integer, and
//! any integer below 1, means page 1. There is no upper bound; a page past the
//! end is simply empty.
//!
//! ```rust
//! use bookstore::books::{parse_page, PageWindow};
//!
//! assert_eq!(parse_page(Some("3")), 3);
//! assert_eq!(parse_page(Some("-2")), 1);
//! assert_eq!(parse_page(Some("0x10")), 16);
//! assert_eq!(parse_page(None), 1);
//!
//! let window = PageWindow::new(3, 4);
//! assert_eq!(window.skip, 8);
//! assert_eq!(window.limit, 4);
//! ```

/// Number of books per page
pub const DEFAULT_PAGE_SIZE: u64 = 4;

/// Skip/limit pair for one page of the title-sorted collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-indexed page number
    pub page: u64,
    /// Number of documents to skip
    pub skip: u64,
    /// Maximum number of documents to return
    pub limit: u64,
}

impl PageWindow {
    /// Window for a 1-indexed page. Page 0 is treated as page 1, a page size
    /// of 0 as 1, and the skip saturates instead of overflowing.
    #[must_use]
    pub const fn new(page: u64, page_size: u64) -> Self {
        let page = if page == 0 { 1 } else { page };
        // a zero limit means "unbounded" to the driver
        let page_size = if page_size == 0 { 1 } else { page_size };
        Self {
            page,
            skip: (page - 1).saturating_mul(page_size),
            limit: page_size,
        }
    }

    /// Window for the raw `page` query value
    #[must_use]
    pub fn from_query(raw: Option<&str>, page_size: u64) -> Self {
        Self::new(parse_page(raw), page_size)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Parse the `page` query value.
///
/// Reads an optional sign and the leading run of digits after any leading
/// whitespace, ignoring whatever follows (`"3abc"` is 3, `"2.9"` is 2). A `0x`
/// or `0X` prefix switches to hexadecimal (`"0x10"` is 16). Absent,
/// non-numeric, zero and negative values give 1. Values too large for `u64`
/// saturate.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 1;
    };

    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        _ => (10, digits),
    };

    let value = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(None, |acc: Option<u64>, d| {
            Some(
                acc.unwrap_or(0)
                    .saturating_mul(u64::from(radix))
                    .saturating_add(u64::from(d)),
            )
        });
    let Some(value) = value else {
        return 1;
    };

    if negative || value == 0 {
        1
    } else {
        value
    }
}
