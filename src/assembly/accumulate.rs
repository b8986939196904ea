use crate::asset::{Asset, AttributeKind};

/// Vertex and index totals of an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeTotals {
    pub primitives: usize,
    pub vertices: u64,
    pub indices: u64,
}

impl AttributeTotals {
    /// Exact byte size of the region holding `kind`
    pub fn region_size(&self, kind: AttributeKind) -> u64 {
        match kind {
            AttributeKind::Index => self.indices * kind.element_size(),
            _ => self.vertices * kind.element_size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives == 0
    }
}

/// Sum position and index counts over every primitive. Nothing is copied.
pub fn accumulate(asset: &Asset) -> AttributeTotals {
    asset
        .primitives()
        .fold(AttributeTotals::default(), |totals, primitive| AttributeTotals {
            primitives: totals.primitives + 1,
            vertices: totals.vertices + primitive.vertex_count() as u64,
            indices: totals.indices + primitive.index_count() as u64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::shapes;

    #[test]
    fn test_totals() {
        let asset = shapes::quad_and_triangle();
        let totals = accumulate(&asset);
        assert_eq!(totals.primitives, 2);
        assert_eq!(totals.vertices, 7);
        assert_eq!(totals.indices, 9);
        assert_eq!(totals.region_size(AttributeKind::Position), 84);
        assert_eq!(totals.region_size(AttributeKind::Normal), 84);
        assert_eq!(totals.region_size(AttributeKind::TexCoord), 56);
        assert_eq!(totals.region_size(AttributeKind::Index), 18);
    }

    #[test]
    fn test_empty_asset() {
        let totals = accumulate(&Asset::default());
        assert!(totals.is_empty());
        assert_eq!(totals.region_size(AttributeKind::Position), 0);
    }
}
