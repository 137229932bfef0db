use clip_timeline::LibraryError;
use clip_timeline::run;

fn main() -> Result<(), LibraryError> {
    run(std::env::args().collect())
}
