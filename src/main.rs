fn main() {
    qa_dashboard_lib::run()
}
