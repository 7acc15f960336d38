//! The `multipart/form-data` payload of a transform call.
//!
//! Parts are collected in order as plain data and turned into a
//! `reqwest::multipart::Form` only when the transport sends them. File
//! content is drained from its reader up front, so a failing reader
//! surfaces before anything reaches the wire.

use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncRead, AsyncReadExt};

const FILE_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File { filename: String, content: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

/// Ordered form fields, in the order they go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelForm {
    fields: Vec<FormField>,
}

impl ModelForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, filename: &str, content: Vec<u8>) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: FieldValue::File {
                filename: filename.to_string(),
                content,
            },
        });
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: FieldValue::Text(value.to_string()),
        });
        self
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Total bytes of file content carried by the form.
    pub fn content_len(&self) -> usize {
        self.fields
            .iter()
            .map(|f| match &f.value {
                FieldValue::File { content, .. } => content.len(),
                FieldValue::Text(_) => 0,
            })
            .sum()
    }

    /// Build the reqwest form. reqwest picks the boundary and sets the
    /// matching `Content-Type` when the form is attached to a request.
    pub fn into_multipart(self) -> reqwest::Result<Form> {
        let mut form = Form::new();
        for field in self.fields {
            form = match field.value {
                FieldValue::Text(value) => form.text(field.name, value),
                FieldValue::File { filename, content } => {
                    let part = Part::bytes(content)
                        .file_name(filename)
                        .mime_str(FILE_MIME)?;
                    form.part(field.name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Drain `reader` to completion.
pub async fn read_model<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}
