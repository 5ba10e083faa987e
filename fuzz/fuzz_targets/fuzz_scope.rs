#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use texscope_analysis::{best_packing, texture_scope};
use texscope_ir::{
    AttrValue, DeviceType, TEXTURE_SPATIAL_LIMIT_ATTR, Target, TensorShape, VirtualDevice,
};

fuzz_target!(|input: (Vec<u32>, i64)| {
    let (dims, limit) = input;
    let target =
        Target::new("opencl").with_attr(TEXTURE_SPATIAL_LIMIT_ATTR, AttrValue::Int(limit));
    let vd = VirtualDevice::new(DeviceType::OpenCl, 0, Arc::new(target));

    // The heuristic must never panic or overflow, whatever the shape.
    let scope = texture_scope(&TensorShape::fixed(&dims), &vd);
    assert!(scope == "global" || scope.starts_with("global.texture"));

    if let [a0, a1, a2, a3, 4] = dims[..] {
        let expected = best_packing([a0, a1, a2, a3], limit).map(|p| p.scope());
        assert_eq!(scope, expected.unwrap_or_else(|| "global".to_owned()));
    }
});
