use mysqlclient_sys as ffi;
use std::{
    mem::zeroed,
    os::raw::{c_ulong, c_void},
    ptr::null_mut,
};

/// Size of the fixed buffer every parameter slot owns. Values up to this size are copied into the
/// slot itself, larger values spill into a heap allocation owned by the slot.
pub const INLINE_CAPACITY: usize = 64;

/// Owns the native memory one parameter of a prepared statement is bound to: the value buffer and
/// the null flag cell the client library reads through the pointers of a `MYSQL_BIND` structure.
///
/// A fresh slot is bound to SQL NULL, which by the client library's convention is a zeroed
/// integer buffer with the null flag raised.
pub struct ParamSlot {
    buffer_type: ffi::enum_field_types,
    inline: [u8; INLINE_CAPACITY],
    spill: Vec<u8>,
    length: c_ulong,
    /// Null flag cell. One byte, read by the client library as its boolean type. `1` binds SQL
    /// NULL regardless of the buffer contents.
    is_null: u8,
}

impl ParamSlot {
    pub fn new() -> Self {
        let mut slot = Self {
            buffer_type: ffi::enum_field_types::MYSQL_TYPE_LONG,
            inline: [0; INLINE_CAPACITY],
            spill: Vec::new(),
            length: 0,
            is_null: 0,
        };
        slot.set_null();
        slot
    }

    /// Copies `payload` into the slot and records its buffer type. The slot no longer binds NULL
    /// after this call.
    pub fn assign(&mut self, buffer_type: ffi::enum_field_types, payload: &[u8]) {
        self.buffer_type = buffer_type;
        self.length = payload.len() as c_ulong;
        self.is_null = 0;
        if payload.len() <= INLINE_CAPACITY {
            self.inline[..payload.len()].copy_from_slice(payload);
        } else {
            // The spilled allocation is reused, it only ever grows.
            self.spill.clear();
            self.spill.extend_from_slice(payload);
        }
    }

    /// Binds SQL NULL: a zeroed four byte integer buffer with the null flag raised.
    pub fn set_null(&mut self) {
        self.assign(ffi::enum_field_types::MYSQL_TYPE_LONG, &0_i32.to_ne_bytes());
        self.is_null = 1;
    }

    /// `true` if the slot currently binds SQL NULL.
    pub fn is_null(&self) -> bool {
        self.is_null != 0
    }

    /// Buffer type the payload is encoded as.
    pub fn buffer_type(&self) -> ffi::enum_field_types {
        self.buffer_type
    }

    /// View of the encoded payload bytes.
    pub fn payload(&self) -> &[u8] {
        let len = self.length as usize;
        if len <= INLINE_CAPACITY {
            &self.inline[..len]
        } else {
            &self.spill
        }
    }

    fn payload_mut_ptr(&mut self) -> *mut u8 {
        if self.length as usize <= INLINE_CAPACITY {
            self.inline.as_mut_ptr()
        } else {
            self.spill.as_mut_ptr()
        }
    }

    /// Fills a zero initialized `MYSQL_BIND` structure describing this slot to the client
    /// library. The returned structure holds pointers into the slot; it stays valid only for as
    /// long as the slot is neither moved nor mutated.
    pub fn fill_bind(&mut self) -> ffi::MYSQL_BIND {
        let mut bind: ffi::MYSQL_BIND = unsafe { zeroed() };
        bind.buffer_type = self.buffer_type;
        bind.buffer = self.payload_mut_ptr() as *mut c_void;
        bind.buffer_length = self.length;
        bind.is_null = (&mut self.is_null as *mut u8).cast();
        bind
    }
}

impl Default for ParamSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the out-parameter cells the client library fills for one result column during a fetch:
/// the value's byte length, its null flag and its truncation flag.
///
/// Binding a result column with an empty data buffer and these three cells, then pulling the
/// value through `mysql_stmt_fetch_column` once its length is known, is the client library's
/// sanctioned access pattern and keeps this crate from guessing buffer sizes upfront.
pub struct Indicator {
    length: c_ulong,
    is_null: u8,
    error: u8,
}

impl Indicator {
    pub fn new() -> Self {
        Self {
            length: 0,
            is_null: 0,
            error: 0,
        }
    }

    /// `true` if the column's value in the current row is SQL NULL.
    pub fn is_null(&self) -> bool {
        self.is_null != 0
    }

    /// Byte length of the column's value in the current row.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    /// Fills a zero initialized `MYSQL_BIND` structure binding no data buffer, only the indicator
    /// cells of this instance. The returned structure holds pointers into `self`; it stays valid
    /// only for as long as `self` is not moved.
    pub fn fill_bind(&mut self) -> ffi::MYSQL_BIND {
        let mut bind: ffi::MYSQL_BIND = unsafe { zeroed() };
        bind.buffer = null_mut();
        bind.buffer_length = 0;
        bind.length = &mut self.length;
        bind.is_null = (&mut self.is_null as *mut u8).cast();
        bind.error = (&mut self.error as *mut u8).cast();
        bind
    }
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Indicator, ParamSlot, INLINE_CAPACITY};
    use mysqlclient_sys as ffi;
    use std::slice;

    fn bound_payload(bind: &ffi::MYSQL_BIND) -> &[u8] {
        unsafe { slice::from_raw_parts(bind.buffer as *const u8, bind.buffer_length as usize) }
    }

    #[test]
    fn fresh_slot_binds_null() {
        let mut slot = ParamSlot::new();
        assert!(slot.is_null());

        let bind = slot.fill_bind();
        assert_eq!(4, bind.buffer_length);
        assert_eq!(1, unsafe { *bind.is_null } as i32);
    }

    #[test]
    fn small_value_lands_in_inline_buffer() {
        let mut slot = ParamSlot::new();
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_STRING, b"hello");

        assert!(!slot.is_null());
        let bind = slot.fill_bind();
        assert_eq!(b"hello", bound_payload(&bind));
        assert_eq!(0, unsafe { *bind.is_null } as i32);
        // Small payloads must not allocate.
        assert_eq!(slot.inline.as_ptr(), bind.buffer as *const u8);
    }

    #[test]
    fn large_value_spills_to_heap() {
        let payload = vec![b'x'; INLINE_CAPACITY + 1];
        let mut slot = ParamSlot::new();
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_BLOB, &payload);

        let bind = slot.fill_bind();
        assert_eq!(payload, bound_payload(&bind));
        assert_eq!(slot.spill.as_ptr(), bind.buffer as *const u8);
    }

    #[test]
    fn rebinding_after_spill_reuses_slot() {
        let mut slot = ParamSlot::new();
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_BLOB, &[b'x'; 100]);
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_LONG, &7_i32.to_ne_bytes());

        let bind = slot.fill_bind();
        assert_eq!(7_i32.to_ne_bytes(), bound_payload(&bind));
        // Back under the inline threshold, the fixed buffer is used again.
        assert_eq!(slot.inline.as_ptr(), bind.buffer as *const u8);
    }

    #[test]
    fn nulling_a_slot_overwrites_previous_value() {
        let mut slot = ParamSlot::new();
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_STRING, b"hello");
        slot.set_null();

        assert!(slot.is_null());
        let bind = slot.fill_bind();
        assert_eq!(1, unsafe { *bind.is_null } as i32);
    }

    #[test]
    fn indicator_bind_references_cells() {
        let mut indicator = Indicator::new();
        let bind = indicator.fill_bind();

        assert!(bind.buffer.is_null());
        assert_eq!(0, bind.buffer_length);
        assert_eq!(&indicator.length as *const _, bind.length as *const _);

        indicator.length = 42;
        indicator.is_null = 1;
        assert_eq!(42, indicator.length());
        assert!(indicator.is_null());
    }
}
