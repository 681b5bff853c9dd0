use crate::device::{BufferData, BufferId, BufferTarget, BufferUsage, Device, ElementType};
use crate::diag::{Diagnostic, Diagnostics};

/// A device buffer stamped with the layout it was uploaded with.
///
/// Downstream code (attribute binding, indexed draws) reads the layout from
/// here instead of tracking it separately. The caller owns the underlying
/// device object and frees it with [`release`](Self::release).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedBuffer {
    id: BufferId,
    target: BufferTarget,
    element_type: ElementType,
    item_size: usize,
    item_count: usize,
    len: usize,
}

impl TypedBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Components per item (3 for a `vec3` attribute, 1 for indices).
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Whole items in the buffer.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Scalar components uploaded (not bytes).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len * self.element_type.byte_size()
    }

    /// Deletes the device buffer.
    pub fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_buffer(self.id);
    }
}

/// Uploads `values` into a new buffer bound to `target`.
///
/// `values.len()` should be a multiple of `item_size`. When it is not, a
/// [`Diagnostic::ShapeMismatch`] is reported and the buffer is still built
/// from all of the data; `item_count` then counts whole items only. An
/// `item_size` of zero is reported the same way and yields no items.
///
/// Returns `None` only when the device cannot allocate a buffer object; the
/// device keeps the cause for the next error poll.
pub fn create_buffer<D: Device + ?Sized>(
    device: &mut D,
    diagnostics: &mut dyn Diagnostics,
    target: BufferTarget,
    values: &[f64],
    element_type: ElementType,
    item_size: usize,
) -> Option<TypedBuffer> {
    if item_size == 0 || values.len() % item_size != 0 {
        diagnostics.report(Diagnostic::ShapeMismatch {
            len: values.len(),
            item_size,
        });
    }

    let id = device.create_buffer()?;
    device.bind_buffer(target, Some(id));
    match element_type {
        ElementType::UnsignedShort16 => {
            let data: Vec<u16> = values.iter().copied().map(to_u16).collect();
            device.buffer_data(target, BufferData::U16(&data), BufferUsage::StaticDraw);
        }
        ElementType::Float32 => {
            let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            device.buffer_data(target, BufferData::F32(&data), BufferUsage::StaticDraw);
        }
    }

    let item_count = values.len().checked_div(item_size).unwrap_or(0);
    log::debug!(
        "buffer {id:?}: {target:?}, {item_count} item(s) of {item_size} x {element_type}"
    );

    Some(TypedBuffer {
        id,
        target,
        element_type,
        item_size,
        item_count,
        len: values.len(),
    })
}

/// Typed-array `u16` conversion: truncate toward zero, wrap modulo 2^16.
///
/// NaN and infinities become 0.
pub fn to_u16(value: f64) -> u16 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(65536.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, HeadlessDevice, HeadlessLimits};
    use crate::diag::DiagnosticLog;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn shorts(bytes: &[u8]) -> Vec<u16> {
        bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn item_count_is_len_over_item_size() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let values = [0.0; 12];

        for item_size in [1, 2, 3, 4, 6, 12] {
            let buf = create_buffer(
                &mut dev,
                &mut log,
                BufferTarget::Array,
                &values,
                ElementType::Float32,
                item_size,
            )
            .unwrap();
            assert_eq!(buf.item_count(), 12 / item_size);
            assert_eq!(buf.item_size(), item_size);
        }
        assert!(log.is_empty());
    }

    #[test]
    fn float_upload_is_static_and_tagged() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::Array,
            &[0.1, -2.5, 3.0],
            ElementType::Float32,
            3,
        )
        .unwrap();

        assert_eq!(buf.target(), BufferTarget::Array);
        assert_eq!(buf.element_type(), ElementType::Float32);
        assert_eq!(buf.byte_len(), 12);
        assert_eq!(dev.buffer_usage(buf.id()), Some(BufferUsage::StaticDraw));
        assert_eq!(floats(dev.buffer_bytes(buf.id()).unwrap()), [0.1f32, -2.5, 3.0]);
    }

    #[test]
    fn index_upload_converts_to_u16() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::ElementArray,
            &[0.0, 1.0, 11.0],
            ElementType::UnsignedShort16,
            1,
        )
        .unwrap();

        assert_eq!(dev.buffer_target(buf.id()), Some(BufferTarget::ElementArray));
        assert_eq!(shorts(dev.buffer_bytes(buf.id()).unwrap()), [0u16, 1, 11]);
    }

    // ── shape mismatch ────────────────────────────────────────────────────

    #[test]
    fn ragged_input_is_reported_but_still_uploaded() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::Array,
            &values,
            ElementType::Float32,
            3,
        )
        .unwrap();

        assert_eq!(log.entries(), [Diagnostic::ShapeMismatch { len: 7, item_size: 3 }]);
        assert_eq!(buf.item_count(), 2);
        assert_eq!(buf.len(), 7);
        assert_eq!(dev.buffer_bytes(buf.id()).unwrap().len(), 28);
    }

    #[test]
    fn zero_item_size_is_reported() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::Array,
            &[1.0],
            ElementType::Float32,
            0,
        )
        .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(buf.item_count(), 0);
    }

    // ── allocation failure ────────────────────────────────────────────────

    #[test]
    fn allocation_failure_is_left_to_the_device() {
        let mut dev = HeadlessDevice::with_limits(HeadlessLimits {
            max_buffers: 0,
            ..Default::default()
        });
        let mut log = DiagnosticLog::new();
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::Array,
            &[1.0, 2.0, 3.0],
            ElementType::Float32,
            3,
        );

        assert!(buf.is_none());
        assert!(log.is_empty());
        assert_eq!(dev.poll_error(), Some(DeviceError::OUT_OF_MEMORY));
    }

    #[test]
    fn release_deletes_device_buffer() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let buf = create_buffer(
            &mut dev,
            &mut log,
            BufferTarget::Array,
            &[1.0],
            ElementType::Float32,
            1,
        )
        .unwrap();
        let id = buf.id();
        buf.release(&mut dev);
        assert!(!dev.is_buffer(id));
    }

    // ── conversion ────────────────────────────────────────────────────────

    #[test]
    fn u16_conversion_wraps_like_typed_arrays() {
        assert_eq!(to_u16(1.9), 1);
        assert_eq!(to_u16(-1.0), 65535);
        assert_eq!(to_u16(65536.0), 0);
        assert_eq!(to_u16(70000.0), 4464);
        assert_eq!(to_u16(-0.5), 0);
        assert_eq!(to_u16(f64::NAN), 0);
        assert_eq!(to_u16(f64::INFINITY), 0);
    }
}
