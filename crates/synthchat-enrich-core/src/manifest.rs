use crate::error::ManifestError;
use crate::issue::{Issue, IssueKind, IssueSink};
use crate::model::{ManifestBlock, ManifestIndex, ManifestRecord};
use serde_json::Value;
use tracing::{debug, info};

fn conversation_id(payload: &Value) -> Option<&str> {
    payload
        .get("generated_conversation")
        .and_then(|conv| conv.get("conversation_id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

fn key_companies(payload: &Value) -> Result<Vec<String>, ManifestError> {
    let raw = match payload
        .get("blueprint")
        .and_then(|blueprint| blueprint.get("key_companies"))
    {
        None | Some(Value::Null) => return Err(ManifestError::MissingKeyCompanies),
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(ManifestError::MissingKeyCompanies)
        }
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ManifestError::InvalidKeyCompanies),
    };

    raw.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(ManifestError::InvalidKeyCompanies)
        })
        .collect()
}

pub fn parse_manifest_block(text: &str) -> Result<ManifestRecord, ManifestError> {
    let payload: Value = serde_json::from_str(text)?;
    if !payload.is_object() {
        return Err(ManifestError::NotAnObject);
    }

    let conversation_id = conversation_id(&payload)
        .ok_or(ManifestError::MissingConversationId)?
        .to_string();
    let key_companies = key_companies(&payload)?;

    Ok(ManifestRecord {
        conversation_id,
        key_companies,
    })
}

#[derive(Debug, Default)]
pub struct IndexBuild {
    pub index: ManifestIndex,
    pub manifests_recognized: usize,
    pub blocks_rejected: usize,
    pub duplicate_ids: usize,
}

pub fn build_index<'a>(
    blocks: impl IntoIterator<Item = &'a ManifestBlock>,
    sink: &mut dyn IssueSink,
) -> IndexBuild {
    let mut build = IndexBuild::default();

    for block in blocks {
        let record = match parse_manifest_block(&block.text) {
            Ok(record) => record,
            Err(exc) => {
                build.blocks_rejected += 1;
                sink.report(
                    Issue::new(exc.issue_kind(), &block.source_file, exc.to_string())
                        .in_block(block.ordinal),
                );
                continue;
            }
        };

        build.manifests_recognized += 1;
        let conversation_id = record.conversation_id.clone();
        let incoming = record.key_companies.clone();
        debug!("loaded manifest for conversation {conversation_id}");

        if let Some(previous) = build.index.insert(record) {
            build.duplicate_ids += 1;
            debug!("manifest for conversation {conversation_id} replaced an earlier one");
            if previous != incoming {
                sink.report(
                    Issue::new(
                        IssueKind::ManifestDuplicateConflict,
                        &block.source_file,
                        format!(
                            "conversation {conversation_id}: key_companies {previous:?} replaced by {incoming:?}"
                        ),
                    )
                    .in_block(block.ordinal),
                );
            }
        }
    }

    info!(
        "loaded manifest mapping for {} conversations ({} manifests recognized, {} rejected)",
        build.index.len(),
        build.manifests_recognized,
        build.blocks_rejected
    );

    build
}
