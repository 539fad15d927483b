//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the rbac engine.
//!
//! ```yaml
//! name: admin-only
//! description: ALLOW engine with a single principal
//! config:
//!   action: ALLOW
//!   policies:
//!     admin:
//!       permissions: [ { any: true } ]
//!       principals: [ { authenticated: { principal_name: { exact: svc-admin } } } ]
//! cases:
//!   - name: admin allowed
//!     request: { principal: svc-admin }
//!     expect: { decision: ALLOW, policy: admin }
//! ```

use crate::TestRequest;
use rbac::prelude::*;
use rbac::RbacConfig;
use serde::Deserialize;
use serde_yaml::with::singleton_map_recursive;
use std::collections::BTreeMap;

/// A complete test fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub config: RbacConfig,
    /// Substring of the expected compile error; when set, `cases` are ignored.
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub request: RequestSpec,
    pub expect: Expect,
}

/// Request attributes for a case
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
}

/// Expected decision
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expect {
    pub decision: DecisionType,
    #[serde(default)]
    pub policy: Option<String>,
}

impl RequestSpec {
    /// Build a [`TestRequest`] from this spec
    pub fn build(&self) -> TestRequest {
        let mut req = TestRequest::new(self.method.as_str())
            .with_source(self.source.as_str())
            .with_destination(self.destination.as_str());
        if let Some(principal) = &self.principal {
            req = req.with_principal(principal.as_str());
        }
        for (name, value) in &self.headers {
            req = req.with_header(name, value);
        }
        req
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Expect,
    pub actual: Decision,
}

impl Fixture {
    /// Parse a fixture from YAML
    ///
    /// Rule enums are written as single-key maps (`- any: true`), not YAML
    /// tags.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(singleton_map_recursive::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Compile the config and run all test cases
    ///
    /// # Errors
    ///
    /// Returns the compile error if the config is rejected.
    pub fn run(&self) -> Result<Vec<CaseResult>, RbacError> {
        let engine = self.config.compile()?;
        Ok(self
            .cases
            .iter()
            .map(|case| {
                let actual = engine.evaluate(&case.request.build());
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual.decision() == case.expect.decision
                        && actual.matched_policy_name() == case.expect.policy.as_deref(),
                    expected: case.expect.clone(),
                    actual,
                }
            })
            .collect())
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        match (self.run(), &self.expect_error) {
            (Ok(results), None) => {
                for result in results {
                    assert!(
                        result.passed,
                        "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                        self.name, result.case_name, result.expected, result.actual
                    );
                }
            }
            (Err(err), Some(expected)) => {
                let message = err.to_string();
                assert!(
                    message.contains(expected.as_str()),
                    "Fixture '{}' failed with '{message}', expected error containing '{expected}'",
                    self.name
                );
            }
            (Ok(_), Some(expected)) => panic!(
                "Fixture '{}' compiled, expected error containing '{expected}'",
                self.name
            ),
            (Err(err), None) => panic!("Fixture '{}' failed to compile: {err}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: deny-blocklist
description: DENY engine with a single blocked address
config:
  action: DENY
  policies:
    blocklist:
      permissions: [ { any: true } ]
      principals: [ { source_ip: { address_prefix: "192.168.1.5", prefix_len: 32 } } ]
cases:
  - name: blocked source
    request: { source: "192.168.1.5" }
    expect: { decision: DENY, policy: blocklist }
  - name: other source
    request: { source: "192.168.1.6" }
    expect: { decision: ALLOW }
"#;

    #[test]
    fn parses_and_runs() {
        let fixture = Fixture::from_yaml(YAML).unwrap();
        assert_eq!(fixture.cases.len(), 2);
        let results = fixture.run().unwrap();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn reports_mismatch() {
        let yaml = YAML.replace("expect: { decision: ALLOW }", "expect: { decision: DENY }");
        let fixture = Fixture::from_yaml(&yaml).unwrap();
        let results = fixture.run().unwrap();
        assert!(results[0].passed);
        assert!(!results[1].passed);
    }

    #[test]
    fn nested_rules_as_single_key_maps() {
        let yaml = r#"
name: nested
config:
  action: ALLOW
  policies:
    readers:
      permissions:
        - and_rules:
            rules:
              - url_path: { prefix: "/store.Reader/" }
              - not_rule: { header: { name: x-debug, present_match: true } }
      principals:
        - or_ids: { ids: [ { authenticated: {} }, { source_ip: { address_prefix: "10.0.0.0", prefix_len: 8 } } ] }
cases:
  - name: authenticated reader
    request: { method: /store.Reader/Get, principal: alice }
    expect: { decision: ALLOW, policy: readers }
  - name: debug header excluded
    request: { method: /store.Reader/Get, principal: alice, headers: { x-debug: "1" } }
    expect: { decision: DENY }
  - name: internal peer
    request: { method: /store.Reader/List, source: "10.2.3.4" }
    expect: { decision: ALLOW, policy: readers }
"#;
        let fixture = Fixture::from_yaml(yaml).unwrap();
        let results = fixture.run().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn multi_document() {
        let yaml = format!("{YAML}\n---\n{YAML}");
        assert_eq!(Fixture::from_yaml_multi(&yaml).unwrap().len(), 2);
    }
}
