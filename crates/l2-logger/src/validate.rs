//! Per-field record validators.
//!
//! Each check is a pure function of the field value (plus, for the two
//! counters, the last accepted value). [`FieldValidators`] owns the counters
//! of one producer; it only advances them through [`FieldValidators::commit`]
//! after a record has been fully accepted, so a rejected record never
//! changes its state.

use crate::record::{FieldValue, Record};
use crate::schema::RecordProfile;
use l2_common::id::is_valid_worker_id;
use l2_common::schema::{
    BLOCK_NUM, BLOCK_SUBTYPE, BLOCK_SUBTYPES, BLOCK_TYPE, BLOCK_TYPES, EXP_NUM, EXP_STATUS,
    EXP_STATUSES, TASK_PARAMS, WORKER_ID,
};
use l2_common::{Error, Result};
use serde_json::Value;

/// Counter values of a record that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub block_num: u64,
    pub exp_num: u64,
}

/// Monotonic counter state of one producer.
#[derive(Debug, Clone, Default)]
pub struct FieldValidators {
    last_block_num: Option<u64>,
    last_exp_num: Option<u64>,
}

impl FieldValidators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_block_num(&self) -> Option<u64> {
        self.last_block_num
    }

    pub fn last_exp_num(&self) -> Option<u64> {
        self.last_exp_num
    }

    /// Run every field check against `record` without changing state.
    ///
    /// Fields are checked in a fixed order: enumerations, worker id, task
    /// parameters, then the two counters.
    pub fn check(&self, record: &Record, profile: RecordProfile) -> Result<Counters> {
        validate_block_type(required(record, BLOCK_TYPE)?)?;
        // Legacy profiles do not require a subtype but still constrain one.
        if profile.has_subtype() || record.contains(BLOCK_SUBTYPE) {
            validate_block_subtype(required(record, BLOCK_SUBTYPE)?)?;
        }
        validate_exp_status(required(record, EXP_STATUS)?)?;
        validate_worker_id(required(record, WORKER_ID)?)?;
        validate_task_params(required(record, TASK_PARAMS)?)?;
        let block_num = validate_block_num(required(record, BLOCK_NUM)?, self.last_block_num)?;
        let exp_num = validate_exp_num(required(record, EXP_NUM)?, self.last_exp_num)?;
        Ok(Counters { block_num, exp_num })
    }

    /// Advance the counters past an accepted record.
    pub fn commit(&mut self, counters: Counters) {
        self.last_block_num = Some(counters.block_num);
        self.last_exp_num = Some(counters.exp_num);
    }
}

fn required<'a>(record: &'a Record, field: &str) -> Result<&'a FieldValue> {
    record
        .get(field)
        .ok_or_else(|| Error::SchemaMismatch(format!("record is missing field '{field}'")))
}

fn validate_counter(field: &'static str, value: &FieldValue, last: Option<u64>) -> Result<u64> {
    let n = value
        .as_int()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| Error::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be a non-negative integer, got {value}"),
        })?;
    match last {
        Some(last) if n < last => Err(Error::OrderingViolation {
            field,
            last,
            value: n,
        }),
        _ => Ok(n),
    }
}

/// `block_num` is a non-negative integer, never below the last accepted one.
pub fn validate_block_num(value: &FieldValue, last: Option<u64>) -> Result<u64> {
    validate_counter(BLOCK_NUM, value, last)
}

/// `exp_num` is a non-negative integer, never below the last accepted one.
pub fn validate_exp_num(value: &FieldValue, last: Option<u64>) -> Result<u64> {
    validate_counter(EXP_NUM, value, last)
}

fn validate_enum(field: &str, value: &FieldValue, allowed: &'static [&'static str]) -> Result<()> {
    match value.as_str() {
        Some(s) if allowed.contains(&s) => Ok(()),
        _ => Err(Error::InvalidEnum {
            field: field.to_string(),
            value: value.to_cell(),
            allowed,
        }),
    }
}

pub fn validate_block_type(value: &FieldValue) -> Result<()> {
    validate_enum(BLOCK_TYPE, value, BLOCK_TYPES)
}

pub fn validate_block_subtype(value: &FieldValue) -> Result<()> {
    validate_enum(BLOCK_SUBTYPE, value, BLOCK_SUBTYPES)
}

pub fn validate_exp_status(value: &FieldValue) -> Result<()> {
    validate_enum(EXP_STATUS, value, EXP_STATUSES)
}

/// `worker_id` may only contain alphanumerics, `_`, `-` and `.`.
pub fn validate_worker_id(value: &FieldValue) -> Result<()> {
    match value.as_str() {
        Some(s) if is_valid_worker_id(s) => Ok(()),
        _ => Err(Error::InvalidFormat {
            field: WORKER_ID.to_string(),
            reason: format!(
                "can only contain alphanumeric characters, underscores, hyphens, or periods, got {value}"
            ),
        }),
    }
}

/// `task_params` is a key/value mapping that survives a JSON round trip.
///
/// A pre-encoded JSON string is rejected: the logger does the encoding.
pub fn validate_task_params(value: &FieldValue) -> Result<()> {
    let FieldValue::Json(params @ Value::Object(_)) = value else {
        return Err(Error::InvalidTaskParams(format!(
            "must be a key/value mapping, got {}",
            value.kind()
        )));
    };
    let encoded = serde_json::to_string(params)
        .map_err(|e| Error::InvalidTaskParams(format!("not JSON serializable: {e}")))?;
    let decoded: Value = serde_json::from_str(&encoded)
        .map_err(|e| Error::InvalidTaskParams(format!("does not decode: {e}")))?;
    if &decoded != params {
        return Err(Error::InvalidTaskParams(
            "does not survive a JSON round trip".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Record {
        Record::from_json(json!({
            "block_num": 4, "exp_num": 4, "worker_id": "worker0",
            "block_type": "train", "block_subtype": "wake", "task_name": "taskA",
            "task_params": {"param1": 1}, "exp_status": "complete", "reward": 123
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_record_passes() {
        let counters = FieldValidators::new().check(&valid(), RecordProfile::Current).unwrap();
        assert_eq!(counters, Counters { block_num: 4, exp_num: 4 });
    }

    #[test]
    fn test_counters_reject_non_integers_and_negatives() {
        assert!(matches!(
            validate_block_num(&FieldValue::from("temp"), None),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_exp_num(&FieldValue::Int(-1), None),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(validate_exp_num(&FieldValue::Float(1.0), None).is_err());
        assert_eq!(validate_block_num(&FieldValue::Int(0), None).unwrap(), 0);
    }

    #[test]
    fn test_counters_are_non_decreasing() {
        assert!(validate_block_num(&FieldValue::Int(4), Some(4)).is_ok());
        assert!(validate_block_num(&FieldValue::Int(10), Some(4)).is_ok());
        match validate_block_num(&FieldValue::Int(2), Some(4)) {
            Err(Error::OrderingViolation { field, last, value }) => {
                assert_eq!((field, last, value), ("block_num", 4, 2));
            }
            other => panic!("expected OrderingViolation, got {other:?}"),
        }
        assert!(matches!(
            validate_exp_num(&FieldValue::Int(3), Some(4)),
            Err(Error::OrderingViolation { field: "exp_num", .. })
        ));
    }

    #[test]
    fn test_counters_are_independent() {
        let mut validators = FieldValidators::new();
        validators.commit(Counters { block_num: 1, exp_num: 10 });
        let record = valid().with("block_num", 1).with("exp_num", 10);
        assert!(validators.check(&record, RecordProfile::Current).is_ok());
        let record = valid().with("block_num", 2).with("exp_num", 9);
        assert!(validators.check(&record, RecordProfile::Current).is_err());
    }

    #[test]
    fn test_check_does_not_advance_state() {
        let validators = FieldValidators::new();
        validators.check(&valid(), RecordProfile::Current).unwrap();
        assert_eq!(validators.last_block_num(), None);
        assert_eq!(validators.last_exp_num(), None);
    }

    #[test]
    fn test_enumerations() {
        assert!(validate_block_type(&"test".into()).is_ok());
        assert!(matches!(
            validate_block_type(&"temp".into()),
            Err(Error::InvalidEnum { .. })
        ));
        assert!(validate_block_subtype(&"sleep".into()).is_ok());
        assert!(validate_block_subtype(&"nap".into()).is_err());
        assert!(validate_exp_status(&"incomplete".into()).is_ok());
        assert!(validate_exp_status(&"Done".into()).is_err());
        assert!(validate_exp_status(&FieldValue::Int(1)).is_err());
    }

    #[test]
    fn test_worker_id() {
        assert!(validate_worker_id(&"worker-default".into()).is_ok());
        assert!(matches!(
            validate_worker_id(&"a+b".into()),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(validate_worker_id(&FieldValue::Int(0)).is_err());
    }

    #[test]
    fn test_task_params() {
        assert!(validate_task_params(&json!({}).into()).is_ok());
        assert!(validate_task_params(&json!({"p": [1, 2.5, "x", null]}).into()).is_ok());
        assert!(matches!(
            validate_task_params(&FieldValue::Bool(true)),
            Err(Error::InvalidTaskParams(_))
        ));
        assert!(validate_task_params(&r#"{"p": 1}"#.into()).is_err());
        assert!(validate_task_params(&json!([1, 2]).into()).is_err());
    }

    #[test]
    fn test_subtype_skipped_for_no_subtype_profile() {
        let mut record = valid();
        record.remove("block_subtype");
        assert!(FieldValidators::new().check(&record, RecordProfile::NoSubtype).is_ok());
        assert!(FieldValidators::new().check(&record, RecordProfile::Current).is_err());
    }

    #[test]
    fn test_present_subtype_checked_for_no_subtype_profile() {
        let validators = FieldValidators::new();
        let record = valid().with("block_subtype", "nap");
        assert!(matches!(
            validators.check(&record, RecordProfile::NoSubtype),
            Err(Error::InvalidEnum { .. })
        ));
        let record = valid().with("block_subtype", "sleep");
        assert!(validators.check(&record, RecordProfile::NoSubtype).is_ok());
    }
}
