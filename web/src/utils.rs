use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    let mut bytes = [0u8; 8];
    for byte in &mut bytes {
        *byte = (256. * random()) as u8;
    }
    u64::from_be_bytes(bytes)
}

/// Whether the event started on a cell of the field, as opposed to the empty space around it.
pub(crate) fn is_over_cell(event: &Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| element.closest(".sapper-cell").ok().flatten())
        .is_some()
}
