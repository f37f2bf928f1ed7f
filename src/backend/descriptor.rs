//! Validated metadata describing the backend REST service.

// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_ROLE_PATH: &str = "/get-user-role";
const DEFAULT_LOGIN_REGISTRATION_PATH: &str = "/get-users";

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum BackendDescriptorError {
	/// The base endpoint must use HTTPS.
	#[error("The base endpoint must use HTTPS: {url}.")]
	InsecureBaseEndpoint {
		/// Base URL that failed validation.
		url: String,
	},
	/// The base endpoint cannot serve as a base for joined paths.
	#[error("The base endpoint cannot be used as a base URL: {url}.")]
	UnusableBaseEndpoint {
		/// Base URL that failed validation.
		url: String,
	},
	/// A request path was empty.
	#[error("The {endpoint} path cannot be empty.")]
	EmptyPath {
		/// Which path failed validation.
		endpoint: &'static str,
	},
	/// A request path did not start with a slash.
	#[error("The {endpoint} path must start with `/`: {path}.")]
	PathMissingSlash {
		/// Which path failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
}

/// Validated backend descriptor: fixed base endpoint plus well-known paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
	/// HTTPS base endpoint all request paths are joined onto.
	pub base: Url,
	/// Path returning the current principal's role.
	pub role_path: String,
	/// Path accepting the login-registration upsert.
	pub login_registration_path: String,
}
impl BackendDescriptor {
	/// Returns a builder seeded with the provided base endpoint.
	pub fn builder(base: Url) -> BackendDescriptorBuilder {
		BackendDescriptorBuilder::new(base)
	}

	/// Joins a request path onto the base endpoint.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	fn validate(&self) -> Result<(), BackendDescriptorError> {
		if self.base.scheme() != "https" {
			return Err(BackendDescriptorError::InsecureBaseEndpoint {
				url: self.base.to_string(),
			});
		}
		if self.base.cannot_be_a_base() {
			return Err(BackendDescriptorError::UnusableBaseEndpoint {
				url: self.base.to_string(),
			});
		}

		validate_path("role", &self.role_path)?;
		validate_path("login registration", &self.login_registration_path)?;

		Ok(())
	}
}

/// Builder for [`BackendDescriptor`] values.
#[derive(Debug)]
pub struct BackendDescriptorBuilder {
	/// Base endpoint all request paths are joined onto.
	pub base: Url,
	/// Role path override; defaults to `/get-user-role`.
	pub role_path: String,
	/// Login-registration path override; defaults to `/get-users`.
	pub login_registration_path: String,
}
impl BackendDescriptorBuilder {
	/// Creates a new builder seeded with the provided base endpoint.
	pub fn new(base: Url) -> Self {
		Self {
			base,
			role_path: DEFAULT_ROLE_PATH.to_owned(),
			login_registration_path: DEFAULT_LOGIN_REGISTRATION_PATH.to_owned(),
		}
	}

	/// Overrides the role path.
	pub fn role_path(mut self, path: impl Into<String>) -> Self {
		self.role_path = path.into();

		self
	}

	/// Overrides the login-registration path.
	pub fn login_registration_path(mut self, path: impl Into<String>) -> Self {
		self.login_registration_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<BackendDescriptor, BackendDescriptorError> {
		let descriptor = BackendDescriptor {
			base: self.base,
			role_path: self.role_path,
			login_registration_path: self.login_registration_path,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), BackendDescriptorError> {
	if path.is_empty() {
		return Err(BackendDescriptorError::EmptyPath { endpoint });
	}
	if !path.starts_with('/') {
		return Err(BackendDescriptorError::PathMissingSlash {
			endpoint,
			path: path.to_owned(),
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_applies_defaults() {
		let descriptor = BackendDescriptor::builder(url("https://api.example.com"))
			.build()
			.expect("Descriptor with defaults should validate.");

		assert_eq!(descriptor.role_path, "/get-user-role");
		assert_eq!(descriptor.login_registration_path, "/get-users");
	}

	#[test]
	fn insecure_base_is_rejected() {
		let err = BackendDescriptor::builder(url("http://api.example.com"))
			.build()
			.expect_err("HTTP base endpoints must be rejected.");

		assert!(matches!(err, BackendDescriptorError::InsecureBaseEndpoint { .. }));
	}

	#[test]
	fn paths_must_be_absolute() {
		let err = BackendDescriptor::builder(url("https://api.example.com"))
			.role_path("get-user-role")
			.build()
			.expect_err("Relative paths must be rejected.");

		assert!(matches!(
			err,
			BackendDescriptorError::PathMissingSlash { endpoint: "role", .. }
		));

		let err = BackendDescriptor::builder(url("https://api.example.com"))
			.login_registration_path("")
			.build()
			.expect_err("Empty paths must be rejected.");

		assert!(matches!(
			err,
			BackendDescriptorError::EmptyPath { endpoint: "login registration" }
		));
	}

	#[test]
	fn endpoint_joins_against_base() {
		let descriptor = BackendDescriptor::builder(url("https://api.example.com"))
			.build()
			.expect("Descriptor with defaults should validate.");
		let endpoint = descriptor
			.endpoint("/scholarships/top")
			.expect("Absolute path should join cleanly.");

		assert_eq!(endpoint.as_str(), "https://api.example.com/scholarships/top");
	}
}
