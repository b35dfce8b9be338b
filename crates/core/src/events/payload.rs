//! Event payloads
//!
//! A payload is a bag of named values carried by a fired event. Accessors
//! take a default and never fail, matching how engine event data is read.

use std::collections::HashMap;

/// One value in an event payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
}

/// Named values carried by one fired event
#[derive(Debug, Clone, Default)]
pub struct EventPayload {
    values: HashMap<String, EventValue>,
}

impl EventPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style int field
    pub fn with_int(mut self, key: &str, value: i32) -> Self {
        self.set_int(key, value);
        self
    }

    /// Builder-style string field
    pub fn with_str(mut self, key: &str, value: &str) -> Self {
        self.set_str(key, value);
        self
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), EventValue::Bool(value));
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), EventValue::Int(value));
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), EventValue::Float(value));
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), EventValue::Str(value.to_string()));
    }

    /// Get a boolean value, or `default` if absent or mistyped
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(EventValue::Bool(v)) => *v,
            Some(EventValue::Int(v)) => *v != 0,
            _ => default,
        }
    }

    /// Get an integer value, or `default` if absent or mistyped
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.get(key) {
            Some(EventValue::Int(v)) => *v,
            Some(EventValue::Bool(v)) => *v as i32,
            _ => default,
        }
    }

    /// Get a float value, or `default` if absent or mistyped
    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(EventValue::Float(v)) => *v,
            Some(EventValue::Int(v)) => *v as f32,
            _ => default,
        }
    }

    /// Get a string value, or `default` if absent or mistyped
    pub fn get_str(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(EventValue::Str(v)) => v.clone(),
            _ => default.to_string(),
        }
    }

    /// Whether the payload carries a value for `key`
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}
