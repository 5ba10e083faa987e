//! Adreno texture layout support matrix.

use texscope_backend_core::{TextureSupport, layout_table_supports};
use texscope_ir::Attrs;

/// Texture storage support for Qualcomm Adreno GPUs (OpenCL).
#[derive(Debug)]
pub struct AdrenoTextureSupport;

/// `(attribute kind, data layout, kernel layout)` combinations whose kernels
/// read and write texture memory. Pools have no kernel layout.
const TEXTURE_LAYOUTS: &[(&str, &str, &str)] = &[
    ("conv2d", "NCHW4c", "OIHW4o"),
    ("conv2d", "NHWC4c", "HWOI4o"),
    ("conv2d", "NHWC4c", "HWIO4o"),
    ("conv2d", "NHWC4c", "OIHW4o"),
    ("conv2d_winograd", "NCHW4c", "OIHW4o"),
    ("conv2d_winograd", "NCHW4c", "HWIO4o"),
    ("conv2d_winograd", "NHWC4c", "OIHW4o"),
    ("conv2d_winograd", "NHWC4c", "HWIO4o"),
    ("global_pool2d", "NCHW4c", ""),
    ("max_pool2d", "NCHW4c", ""),
    ("avg_pool2d", "NCHW4c", ""),
];

impl TextureSupport for AdrenoTextureSupport {
    fn hardware_name(&self) -> &str {
        "Qualcomm Adreno"
    }

    fn supports_texture(&self, attrs: &Attrs) -> bool {
        layout_table_supports(TEXTURE_LAYOUTS, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conv2d_layouts() {
        let s = AdrenoTextureSupport;
        assert!(s.supports_texture(&Attrs::conv2d("NCHW4c", "OIHW4o")));
        assert!(s.supports_texture(&Attrs::conv2d("NHWC4c", "HWOI4o")));
        assert!(s.supports_texture(&Attrs::conv2d("NHWC4c", "HWIO4o")));
        assert!(s.supports_texture(&Attrs::conv2d("NHWC4c", "OIHW4o")));
        assert!(!s.supports_texture(&Attrs::conv2d("NCHW4c", "HWIO4o")));
        assert!(!s.supports_texture(&Attrs::conv2d("NCHW", "OIHW")));
    }

    #[test]
    fn winograd_layouts() {
        let s = AdrenoTextureSupport;
        for data in ["NCHW4c", "NHWC4c"] {
            for kernel in ["OIHW4o", "HWIO4o"] {
                assert!(s.supports_texture(&Attrs::conv2d_winograd(data, kernel)));
            }
        }
        assert!(!s.supports_texture(&Attrs::conv2d_winograd("NHWC4c", "HWOI4o")));
    }

    #[test]
    fn pools_need_nchw4c() {
        let s = AdrenoTextureSupport;
        assert!(s.supports_texture(&Attrs::global_pool2d("NCHW4c")));
        assert!(s.supports_texture(&Attrs::max_pool2d("NCHW4c")));
        assert!(s.supports_texture(&Attrs::avg_pool2d("NCHW4c")));
        assert!(!s.supports_texture(&Attrs::max_pool2d("NHWC4c")));
        assert!(!s.supports_texture(&Attrs::avg_pool2d("NCHW")));
    }

    #[test]
    fn calls_without_layout_attrs_are_unsupported() {
        assert!(!AdrenoTextureSupport.supports_texture(&Attrs::None));
    }
}
