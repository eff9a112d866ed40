//! Test-case record
//!
//! Little-endian layout, one record per file:
//!
//! ```text
//! i32                 element_count   (patched after the elements)
//! element_count times:
//!   i32               name_length
//!   [u8; name_length] name
//!   i32               value_length
//!   [u8; value_length] value
//! ```

use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::error::{FormatError, FormatResult};

/// Bytes shown per value by the `Display` impl
const PREVIEW_BYTES: usize = 32;

/// One named value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseElement {
    pub name: String,
    pub value: Vec<u8>,
}

impl TestCaseElement {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Concrete values of one outcome, in record order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    elements: Vec<TestCaseElement>,
}

impl TestCase {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.elements.push(TestCaseElement::new(name, value));
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[TestCaseElement] {
        &self.elements
    }

    /// Look up an element by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_slice())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Write the record through a [`TestCaseWriter`]
    ///
    /// # Errors
    /// Returns error on IO failure or a length beyond the wire limit.
    pub fn write_to<W: Write + Seek>(&self, out: W) -> FormatResult<W> {
        let mut writer = TestCaseWriter::new(out)?;
        for element in &self.elements {
            writer.write_element(element.name.as_bytes(), &element.value)?;
        }
        writer.finish()
    }

    /// Encode into a fresh buffer
    ///
    /// # Errors
    /// Returns error on a length beyond the wire limit.
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Read one record, rejecting trailing bytes
    ///
    /// # Errors
    /// Returns error on truncation, negative lengths, non-UTF-8 names or
    /// leftover input.
    pub fn read_from<R: Read>(mut input: R) -> FormatResult<Self> {
        let count = read_length(&mut input, "element count")?;
        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let name_len = read_length(&mut input, "name length")?;
            let name = String::from_utf8(read_bytes(&mut input, "name", name_len)?)?;
            let value_len = read_length(&mut input, "value length")?;
            let value = read_bytes(&mut input, "value", value_len)?;
            elements.push(TestCaseElement { name, value });
        }

        let mut rest = Vec::new();
        input.read_to_end(&mut rest)?;
        if !rest.is_empty() {
            return Err(FormatError::TrailingBytes(rest.len()));
        }
        Ok(Self { elements })
    }

    /// Decode a record held in memory
    ///
    /// # Errors
    /// See [`TestCase::read_from`].
    pub fn decode(bytes: &[u8]) -> FormatResult<Self> {
        Self::read_from(bytes)
    }
}

impl FromIterator<TestCaseElement> for TestCase {
    fn from_iter<I: IntoIterator<Item = TestCaseElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} element(s)", self.elements.len())?;
        for element in &self.elements {
            let shown = &element.value[..element.value.len().min(PREVIEW_BYTES)];
            let ellipsis = if shown.len() < element.value.len() { "..." } else { "" };
            writeln!(
                f,
                "  {} ({} bytes): {}{}",
                element.name,
                element.value.len(),
                hex::encode(shown),
                ellipsis
            )?;
        }
        Ok(())
    }
}

/// Streaming record writer
///
/// Emits a placeholder count, appends elements, then seeks back and patches
/// the count in [`TestCaseWriter::finish`].
#[derive(Debug)]
pub struct TestCaseWriter<W: Write + Seek> {
    inner: W,
    start: u64,
    count: usize,
}

impl<W: Write + Seek> TestCaseWriter<W> {
    /// Start a record at the writer's current position
    ///
    /// # Errors
    /// Returns error if the placeholder cannot be written.
    pub fn new(mut inner: W) -> FormatResult<Self> {
        let start = inner.stream_position()?;
        inner.write_all(&0i32.to_le_bytes())?;
        Ok(Self {
            inner,
            start,
            count: 0,
        })
    }

    /// Append one name/value pair
    ///
    /// # Errors
    /// Returns error on IO failure or a length beyond the wire limit.
    pub fn write_element(&mut self, name: &[u8], value: &[u8]) -> FormatResult<()> {
        let name_len = wire_length("name", name.len())?;
        let value_len = wire_length("value", value.len())?;
        wire_length("element count", self.count + 1)?;

        self.inner.write_all(&name_len.to_le_bytes())?;
        self.inner.write_all(name)?;
        self.inner.write_all(&value_len.to_le_bytes())?;
        self.inner.write_all(value)?;
        self.count += 1;
        Ok(())
    }

    /// Elements written so far
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Patch the element count and hand back the writer
    ///
    /// # Errors
    /// Returns error if seeking or writing fails.
    pub fn finish(mut self) -> FormatResult<W> {
        let end = self.inner.stream_position()?;
        let count = wire_length("element count", self.count)?;
        self.inner.seek(SeekFrom::Start(self.start))?;
        self.inner.write_all(&count.to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn wire_length(field: &'static str, len: usize) -> FormatResult<i32> {
    i32::try_from(len).map_err(|_| FormatError::LengthOverflow { field, len })
}

fn read_length<R: Read>(input: &mut R, field: &'static str) -> FormatResult<usize> {
    let raw = read_bytes(input, field, 4)?;
    let value = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    usize::try_from(value).map_err(|_| FormatError::NegativeLength { field, value })
}

fn read_bytes<R: Read>(input: &mut R, field: &'static str, len: usize) -> FormatResult<Vec<u8>> {
    // take() bounds the allocation by what the input actually holds
    let mut buf = Vec::new();
    input.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(FormatError::Truncated {
            field,
            expected: len,
            found: buf.len(),
        });
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample() -> TestCase {
        let mut tc = TestCase::new();
        tc.push("argv_1", b"AAAA".to_vec());
        tc.push("input.dat", vec![1, 2, 3]);
        tc
    }

    #[test]
    fn layout_is_byte_exact() {
        let mut tc = TestCase::new();
        tc.push("ab", b"xyz".to_vec());

        let bytes = tc.encode().unwrap();
        assert_eq!(
            bytes,
            vec![
                1, 0, 0, 0, // element count
                2, 0, 0, 0, b'a', b'b', // name
                3, 0, 0, 0, b'x', b'y', b'z', // value
            ]
        );
    }

    #[test]
    fn empty_record_is_a_zero_count() {
        assert_eq!(TestCase::new().encode().unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn count_is_patched_after_elements() {
        let mut writer = TestCaseWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.write_element(b"a", b"1").unwrap();
        writer.write_element(b"b", b"2").unwrap();
        writer.write_element(b"c", b"3").unwrap();
        assert_eq!(writer.count(), 3);

        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(&bytes[..4], &3i32.to_le_bytes());
        assert_eq!(TestCase::decode(&bytes).unwrap().len(), 3);
    }

    #[test]
    fn writer_appends_after_patching() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all(b"HDR").unwrap();
        let mut writer = TestCaseWriter::new(cursor).unwrap();
        writer.write_element(b"n", b"v").unwrap();
        let mut cursor = writer.finish().unwrap();
        cursor.write_all(b"!").unwrap();

        let bytes = cursor.into_inner();
        assert_eq!(&bytes[..3], b"HDR");
        assert_eq!(&bytes[3..7], &1i32.to_le_bytes());
        assert_eq!(bytes.last(), Some(&b'!'));
    }

    #[test]
    fn decode_preserves_order_and_content() {
        let tc = sample();
        let decoded = TestCase::decode(&tc.encode().unwrap()).unwrap();
        assert_eq!(decoded, tc);
        assert_eq!(decoded.get("input.dat"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn truncated_value_rejected() {
        let bytes = sample().encode().unwrap();
        let err = TestCase::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { field: "value", .. }));
    }

    #[test]
    fn negative_length_rejected() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(-5i32).to_le_bytes());
        let err = TestCase::decode(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::NegativeLength { value: -5, .. }));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = sample().encode().unwrap();
        bytes.push(0);
        assert!(matches!(
            TestCase::decode(&bytes).unwrap_err(),
            FormatError::TrailingBytes(1)
        ));
    }

    #[test]
    fn huge_declared_length_does_not_allocate() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&i32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        let err = TestCase::decode(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { found: 3, .. }));
    }

    #[test]
    fn display_shows_hex_preview() {
        let text = sample().to_string();
        assert!(text.starts_with("2 element(s)"));
        assert!(text.contains("argv_1 (4 bytes): 41414141"));
    }

    proptest! {
        #[test]
        fn prop_count_matches_elements_written(
            elements in proptest::collection::vec(
                ("[a-z_0-9]{1,12}", proptest::collection::vec(any::<u8>(), 0..48)),
                0..8,
            )
        ) {
            let tc: TestCase = elements
                .iter()
                .map(|(n, v)| TestCaseElement::new(n.clone(), v.clone()))
                .collect();
            let bytes = tc.encode().unwrap();

            let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            prop_assert_eq!(count as usize, elements.len());
            prop_assert_eq!(TestCase::decode(&bytes).unwrap(), tc);
        }
    }
}
