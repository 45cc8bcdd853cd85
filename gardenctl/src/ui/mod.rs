//! Terminal rendering of values that have no natural YAML or JSON form.

mod access_restriction;
