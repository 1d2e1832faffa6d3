//! Request bodies for the posts service.
//!
//! Shape rules live on the structs as `validator` attributes; failures are
//! flattened into `{field: [messages]}` and returned as a 422.

use std::borrow::Cow;

use quill_blob::decode_data_url;
use quill_core::{is_object_id, ObjectId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::commands::{AddComment, CreatePost, UpdatePost};
use crate::error::{LifecycleError, LifecycleResult};

const POSTS_ERROR: &str = "Posts schema validation failed";
const COMMENTS_ERROR: &str = "Comments schema validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePostSchema {
    #[validate(required(message = "title is required"), custom(function = "non_blank"))]
    pub title: Option<String>,

    #[validate(required(message = "author is required"), custom(function = "object_id"))]
    pub author: Option<String>,

    #[validate(required(message = "content is required"), custom(function = "non_blank"))]
    pub content: Option<String>,

    /// `data:image/...;base64,...`
    #[validate(required(message = "photo is required"), custom(function = "non_blank"))]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostSchema {
    #[validate(required(message = "title is required"), custom(function = "non_blank"))]
    pub title: Option<String>,

    #[validate(required(message = "author is required"), custom(function = "object_id"))]
    pub author: Option<String>,

    #[validate(required(message = "content is required"), custom(function = "non_blank"))]
    pub content: Option<String>,

    #[validate(custom(function = "non_blank"))]
    pub photo: Option<String>,

    #[validate(range(min = 1, message = "version must be at least 1"))]
    pub version: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentSchema {
    #[validate(required(message = "author is required"), custom(function = "object_id"))]
    pub author: Option<String>,

    #[validate(
        required(message = "text is required"),
        custom(function = "non_blank"),
        length(max = 2000, message = "text must be at most 2000 chars")
    )]
    pub text: Option<String>,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("non_blank").with_message(Cow::Borrowed("must not be empty")));
    }
    Ok(())
}

fn object_id(value: &str) -> Result<(), ValidationError> {
    if !is_object_id(value) {
        return Err(ValidationError::new("object_id")
            .with_message(Cow::Borrowed("must be a 24-character hex id")));
    }
    Ok(())
}

pub fn parse_create(data: &Value) -> LifecycleResult<CreatePost> {
    let schema: CreatePostSchema = validate(data, POSTS_ERROR)?;
    let photo = decode_data_url(&required(schema.photo)?)?;

    Ok(CreatePost::new(
        required(schema.title)?,
        author_id(schema.author)?,
        required(schema.content)?,
        photo,
    ))
}

pub fn parse_update(data: &Value) -> LifecycleResult<UpdatePost> {
    let schema: UpdatePostSchema = validate(data, POSTS_ERROR)?;

    let mut cmd = UpdatePost::new(
        required(schema.title)?,
        author_id(schema.author)?,
        required(schema.content)?,
    );
    if let Some(photo) = schema.photo {
        cmd = cmd.with_photo(decode_data_url(&photo)?);
    }
    if let Some(version) = schema.version {
        cmd = cmd.with_expected_version(version);
    }
    Ok(cmd)
}

pub fn parse_comment(data: &Value) -> LifecycleResult<AddComment> {
    let schema: CreateCommentSchema = validate(data, COMMENTS_ERROR)?;
    Ok(AddComment::new(author_id(schema.author)?, required(schema.text)?))
}

fn validate<T>(data: &Value, error_message: &str) -> LifecycleResult<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| LifecycleError::Validation {
        message: error_message.to_string(),
        errors: Some(json!({ "_schema": [e.to_string()] })),
    })?;

    parsed.validate().map_err(|e| LifecycleError::Validation {
        message: error_message.to_string(),
        errors: Some(flatten(&e)),
    })?;

    Ok(parsed)
}

fn flatten(errs: &ValidationErrors) -> Value {
    let mut out = Map::new();
    push_errors(&mut out, "", errs);
    Value::Object(out)
}

fn push_errors(out: &mut Map<String, Value>, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    if let Value::Array(list) = out.entry(key.clone()).or_insert_with(|| json!([])) {
                        list.push(Value::String(msg));
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => push_errors(out, &key, nested),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    push_errors(out, &format!("{key}[{idx}]"), nested);
                }
            }
        }
    }
}

// Fields below were checked by `validate`; these only unwrap.

fn required(value: Option<String>) -> LifecycleResult<String> {
    value.ok_or_else(|| LifecycleError::validation("missing required field"))
}

fn author_id(value: Option<String>) -> LifecycleResult<ObjectId> {
    let raw = required(value)?;
    ObjectId::parse(&raw)
        .map_err(|_| LifecycleError::invalid_field("author", "must be a 24-character hex id"))
}
