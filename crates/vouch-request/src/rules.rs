//! Per-source rule sets and the functions that apply them.
//!
//! Sources are validated in the order json, query, form, headers. The first
//! violation aborts the request and the context is left as it was.

use tracing::debug;

use vouch_contracts::{Value, VouchResult};
use vouch_core::Schema;
use vouch_verify::Verifier;

use crate::request::{Headers, Params, RequestData};

/// The schemas a handler declares, one per request source.
#[derive(Debug, Clone, Default)]
pub struct RequestRules {
    pub query: Option<Schema>,
    pub form: Option<Schema>,
    pub json: Option<Schema>,
    pub headers: Option<Schema>,
    /// The JSON body is an array of objects, each validated against `json`.
    pub many: bool,
}

impl RequestRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn form(mut self, schema: Schema) -> Self {
        self.form = Some(schema);
        self
    }

    pub fn json(mut self, schema: Schema) -> Self {
        self.json = Some(schema);
        self
    }

    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    pub fn many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    /// Validate every source that has rules and return a fresh context.
    pub fn apply(&self, verifier: &Verifier, data: &RequestData) -> VouchResult<Params> {
        let mut params = Params::default();
        self.apply_into(verifier, data, &mut params)?;
        Ok(params)
    }

    /// Validate into an existing context, replacing only the slots this rule
    /// set covers. Nothing is written unless every source passes.
    pub fn apply_into(&self, verifier: &Verifier, data: &RequestData, params: &mut Params) -> VouchResult<()> {
        let json = match &self.json {
            Some(schema) => {
                debug!(many = self.many, "validating json body");
                Some(verifier.verify_data(&data.json_value(), schema, self.many)?)
            }
            None => None,
        };
        let query = match &self.query {
            Some(schema) => {
                debug!(fields = data.query.len(), "validating query string");
                Some(verifier.verify(&data.query, schema)?)
            }
            None => None,
        };
        let form = match &self.form {
            Some(schema) => {
                debug!(fields = data.form.len(), "validating form body");
                Some(verifier.verify(&data.form, schema)?)
            }
            None => None,
        };
        let headers = match &self.headers {
            Some(schema) => {
                debug!(fields = data.headers.len(), "validating headers");
                Some(verifier.verify(&Headers(&data.headers), schema)?)
            }
            None => None,
        };

        if json.is_some() {
            params.json = json;
        }
        if query.is_some() {
            params.query = query;
        }
        if form.is_some() {
            params.form = form;
        }
        if headers.is_some() {
            params.headers = headers;
        }
        Ok(())
    }
}

/// Single-schema mode: validate whatever the request carries.
///
/// With a JSON body, that body is validated, in `many` mode when it is an
/// array. Without one, query and form fields are merged (form wins on
/// conflicts) and validated as one object.
pub fn merged(verifier: &Verifier, data: &RequestData, schema: &Schema) -> VouchResult<Value> {
    match &data.json {
        Some(body) => {
            let many = body.is_array();
            debug!(many, "validating json body against merged schema");
            verifier.verify_data(&data.json_value(), schema, many)
        }
        None => {
            let mut fields = data.query.clone();
            fields.extend(data.form.iter().map(|(k, v)| (k.clone(), v.clone())));
            debug!(fields = fields.len(), "validating merged query and form");
            verifier.verify(&fields, schema)
        }
    }
}
