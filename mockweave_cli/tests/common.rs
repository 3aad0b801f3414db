use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn mockweave_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mockweave"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("MOCKWEAVE_LOG");
	cmd
}
