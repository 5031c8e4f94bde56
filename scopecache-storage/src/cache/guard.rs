//! Identity and validation guard.

use scopecache_core::{Model, ModelError, ModelHandle, ModelId, ModelKind};

use super::registry::KindRegistry;

/// Check that `expected` is a recognized kind for `M` and, when a model is
/// given, that its runtime kind matches.
///
/// An absent model passes: absence is a "not found" outcome, not a type
/// error. Use [`require_found`] when a value is mandatory.
pub fn check_model<M: Model>(
    model: Option<&ModelHandle<M>>,
    expected: ModelKind,
    registry: &KindRegistry,
) -> Result<(), ModelError> {
    registry.check::<M>(expected)?;

    match model {
        Some(model) if model.kind() != expected => Err(ModelError::InvalidKind {
            expected,
            actual: model.kind(),
        }),
        _ => Ok(()),
    }
}

/// Turn an absent value into `NotFound`.
pub fn require_found<M>(
    model: Option<ModelHandle<M>>,
    kind: ModelKind,
    id: Option<ModelId>,
) -> Result<ModelHandle<M>, ModelError> {
    model.ok_or(ModelError::NotFound { kind, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: ModelKind = ModelKind::new("Item");
    const OTHER: ModelKind = ModelKind::new("Other");

    /// Kind is data here, so one type can carry several kinds.
    struct Row {
        kind: ModelKind,
        id: ModelId,
    }

    impl Model for Row {
        fn kind(&self) -> ModelKind {
            self.kind
        }
        fn id(&self) -> ModelId {
            self.id
        }
    }

    fn row(kind: ModelKind, id: u64) -> ModelHandle<Row> {
        ModelHandle::new(Row {
            kind,
            id: ModelId::new(id).unwrap(),
        })
    }

    fn registry() -> KindRegistry {
        KindRegistry::new().with::<Row>(ITEM).unwrap()
    }

    #[test]
    fn test_matching_kind_passes() {
        assert!(check_model(Some(&row(ITEM, 1)), ITEM, &registry()).is_ok());
    }

    #[test]
    fn test_absent_model_passes() {
        assert!(check_model::<Row>(None, ITEM, &registry()).is_ok());
    }

    #[test]
    fn test_mismatched_kind_fails() {
        let err = check_model(Some(&row(OTHER, 1)), ITEM, &registry()).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidKind {
                expected: ITEM,
                actual: OTHER
            }
        );
    }

    #[test]
    fn test_unrecognized_expected_kind_fails_first() {
        let err = check_model(Some(&row(OTHER, 1)), OTHER, &registry()).unwrap_err();
        assert!(matches!(err, ModelError::KindMisconfigured { .. }));
    }

    #[test]
    fn test_require_found() {
        let id = ModelId::new(2).unwrap();
        assert!(require_found(Some(row(ITEM, 2)), ITEM, Some(id)).is_ok());
        assert_eq!(
            require_found::<Row>(None, ITEM, Some(id)).unwrap_err(),
            ModelError::NotFound {
                kind: ITEM,
                id: Some(id)
            }
        );
    }
}
