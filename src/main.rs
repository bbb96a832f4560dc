fn main() -> anyhow::Result<()> {
    levelscript_editor::run()
}
