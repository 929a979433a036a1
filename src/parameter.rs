use crate::handles::ParamSlot;
use mysqlclient_sys as ffi;

/// Values of types implementing this trait can be bound to the placeholders of a prepared
/// statement with [`crate::Prepared::bind`].
///
/// Implementations place the value's native representation into the statement's bind slot for the
/// placeholder: a buffer type of the client library plus the payload bytes in the machine's byte
/// order, as its C calling convention requires. `Option<T>` of any implementing type binds SQL
/// NULL for `None`.
pub trait Parameter {
    /// Writes the value into `slot`.
    fn bind_to(&self, slot: &mut ParamSlot);
}

impl Parameter for i32 {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_LONG, &self.to_ne_bytes());
    }
}

/// Travels as a signed eight byte integer. The value range of `u32` is fully contained in it, so
/// the unsigned flag of the C interface is never needed.
impl Parameter for u32 {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(
            ffi::enum_field_types::MYSQL_TYPE_LONGLONG,
            &i64::from(*self).to_ne_bytes(),
        );
    }
}

impl Parameter for i64 {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(
            ffi::enum_field_types::MYSQL_TYPE_LONGLONG,
            &self.to_ne_bytes(),
        );
    }
}

impl Parameter for f64 {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_DOUBLE, &self.to_ne_bytes());
    }
}

/// Travels as a four byte integer holding `0` or `1`, the representation `BOOL` columns use.
impl Parameter for bool {
    fn bind_to(&self, slot: &mut ParamSlot) {
        let value: i32 = if *self { 1 } else { 0 };
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_LONG, &value.to_ne_bytes());
    }
}

impl Parameter for &str {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_STRING, self.as_bytes());
    }
}

impl Parameter for String {
    fn bind_to(&self, slot: &mut ParamSlot) {
        self.as_str().bind_to(slot)
    }
}

impl Parameter for &[u8] {
    fn bind_to(&self, slot: &mut ParamSlot) {
        slot.assign(ffi::enum_field_types::MYSQL_TYPE_BLOB, self);
    }
}

impl Parameter for Vec<u8> {
    fn bind_to(&self, slot: &mut ParamSlot) {
        self.as_slice().bind_to(slot)
    }
}

impl<T> Parameter for Option<T>
where
    T: Parameter,
{
    fn bind_to(&self, slot: &mut ParamSlot) {
        match self {
            Some(value) => value.bind_to(slot),
            None => slot.set_null(),
        }
    }
}
