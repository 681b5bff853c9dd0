use crate::device::Device;

use super::TypedBuffer;

/// Points vertex attribute `location` at `buffer`.
///
/// Enables the slot, binds the buffer to its recorded target and configures a
/// tightly packed, non-normalized pointer from the buffer's stored layout.
/// Misuse (for example an index buffer, or a location past the device limit)
/// surfaces through the device's error flag.
pub fn bind_vertex_buffer<D: Device + ?Sized>(device: &mut D, location: u32, buffer: &TypedBuffer) {
    device.enable_vertex_attrib_array(location);
    device.bind_buffer(buffer.target(), Some(buffer.id()));
    device.vertex_attrib_pointer(
        location,
        buffer.item_size(),
        buffer.element_type(),
        false,
        0,
        0,
    );
}
