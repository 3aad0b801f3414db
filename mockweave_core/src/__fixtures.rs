use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use crate::Dialect;
use crate::FixtureSettings;
use crate::MockweaveResult;
use crate::compile_fixture;

/// A dbt unit test with one block reference and one wrapped expectation.
pub(crate) const CUSTOMER_TEMPLATE: &str = r#"{{ config(tags=['unit-test']) }}

{% call dbt_unit_testing.test('customers', 'counts orders per customer') %}
  {% call dbt_unit_testing.mock_ref('stg_customers', {"input_format": "sql", "source_file": "fixtures/customers.csv"}) %}
  {% endcall %}
  {% call dbt_unit_testing.expect({"input_format": "sql", "source_file": "fixtures/expected.csv"}) %}{% endcall %}
{% endcall %}
"#;

pub(crate) const CUSTOMERS_CSV: &str = "\"Id[number(10,0)]\",Name\n1,alice\n2,bob\n";

pub(crate) const EXPECTED_CSV: &str = "\"Id[number(10,0)]\",\"Orders[number(10,0)]\"\n1,3\n";

pub(crate) const CUSTOMERS_SQL: &str = "SELECT 1::NUMBER(10,0) AS ID, 'alice'::VARCHAR(16777216) AS \
                                        NAME\nUNION ALL\nSELECT 2::NUMBER(10,0) AS ID, \
                                        'bob'::VARCHAR(16777216) AS NAME";

pub(crate) const EXPECTED_SQL: &str = "SELECT 1::NUMBER(10,0) AS ID, 3::NUMBER(10,0) AS ORDERS";

/// Write `content` to `root/relative`, creating parent directories.
pub(crate) fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	path
}

pub(crate) fn read_file(path: &Path) -> String {
	fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

pub(crate) fn modified(path: &Path) -> SystemTime {
	fs::metadata(path)
		.and_then(|metadata| metadata.modified())
		.unwrap_or_else(|e| panic!("mtime {}: {e}", path.display()))
}

pub(crate) fn set_modified(path: &Path, time: SystemTime) {
	fs::File::options()
		.write(true)
		.open(path)
		.and_then(|file| file.set_modified(time))
		.unwrap_or_else(|e| panic!("set mtime {}: {e}", path.display()));
}

pub(crate) fn seconds_ago(seconds: u64) -> SystemTime {
	SystemTime::now() - Duration::from_secs(seconds)
}

/// Compile delimited fixture text with default settings.
pub(crate) fn compile_csv(dialect: Dialect, content: &str) -> MockweaveResult<String> {
	compile_fixture(
		Path::new("fixture.csv"),
		content,
		&FixtureSettings::new(dialect),
	)
}

/// Lay out the customer project under `root` with every input dated in the
/// past so freshly generated outputs are newer.
pub(crate) fn customer_project(root: &Path) -> PathBuf {
	let templates = root.join("test-templates");
	let paths = [
		write_file(&templates, "customers/test_customers.sql", CUSTOMER_TEMPLATE),
		write_file(&templates, "customers/fixtures/customers.csv", CUSTOMERS_CSV),
		write_file(&templates, "customers/fixtures/expected.csv", EXPECTED_CSV),
	];
	for path in &paths {
		set_modified(path, seconds_ago(600));
	}
	templates
}
