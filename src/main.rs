use gateprobe::error::AppResult;

fn main() -> AppResult<()> {
    gateprobe::run()
}
