// THEORY:
// The `ShadowClassifier` makes the actual shadow-versus-object decision for one
// connected component. It encodes a single physical observation: a shadow darkens a
// surface but does not change its color. So a shadow patch, looked at from just
// outside its edge, borders a pixel of the very same surface color that is lit,
// i.e. lighter.
//
// The rule, in quantized L*a*b* terms. A component with key (L, A, B) is a shadow if
// at least one border pixel with key (bL, bA, bB) satisfies all of:
//   - bL > L           the neighbor is strictly lighter
//   - L > 0            the component is not in the zero-lightness bin
//   - bA == A, bB == B the neighbor has the same chroma
//
// An object, by contrast, differs in chroma from its surroundings, and a dark patch
// on a uniformly dark surface has no lighter neighbor at all.
//
// Existence is all that matters. The search stops at the first qualifying border
// pixel, and which pixel that is carries no meaning.

use crate::core_modules::color_binner::{ColorBinKey, QuantizationSteps};
use crate::core_modules::lab_planes::{LabPlanes, PixelCoordinate};

/// Quantizes border pixels and tests them against a component's bin key.
pub struct ShadowClassifier<'a> {
    planes: &'a LabPlanes,
    steps: &'a QuantizationSteps,
}

impl<'a> ShadowClassifier<'a> {
    pub fn new(planes: &'a LabPlanes, steps: &'a QuantizationSteps) -> Self {
        Self { planes, steps }
    }

    /// The per-pixel rule.
    #[inline]
    pub fn casts_shadow_on(component: ColorBinKey, border: ColorBinKey) -> bool {
        border.l > component.l
            && component.l > 0
            && border.a == component.a
            && border.b == component.b
    }

    /// Returns the first border pixel that proves `component_key` is a shadow.
    pub fn find_lighter_match(
        &self,
        component_key: ColorBinKey,
        border: &[PixelCoordinate],
    ) -> Option<PixelCoordinate> {
        if component_key.l == 0 {
            return None;
        }
        border.iter().copied().find(|&point| {
            let border_key = self.steps.quantize(self.planes.sample(point));
            Self::casts_shadow_on(component_key, border_key)
        })
    }

    pub fn is_shadow(&self, component_key: ColorBinKey, border: &[PixelCoordinate]) -> bool {
        self.find_lighter_match(component_key, border).is_some()
    }
}
