use crate::{
    error::Error,
    model::ObjectModel,
    value::{ObjectId, ResourceId},
};

/// Give every temporary id a fresh permanent resource id.
///
/// Ids that are already permanent come back unchanged, so calling this twice
/// on the same input is harmless.
pub(crate) fn assign_permanent_ids(
    model: &ObjectModel,
    ids: &[ObjectId],
) -> Result<Vec<ObjectId>, Error> {
    ids.iter()
        .map(|id| {
            model.try_entity(id.entity())?;

            Ok(if id.is_temporary() {
                ObjectId::permanent(id.entity(), ResourceId::generate())
            } else {
                id.clone()
            })
        })
        .collect()
}
