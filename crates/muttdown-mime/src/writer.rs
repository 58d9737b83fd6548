//! MIME serialization.

use crate::message::{Body, Part};
use rand::Rng;

impl Part {
    /// Serializes the part (and all children) with LF line endings.
    ///
    /// Parsed parts are written back as they were read. Containers built
    /// without a `boundary` parameter get a generated one that does not occur
    /// in any of their children.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut Vec<u8>) {
        let children = match &self.body {
            Body::Single(body) => {
                out.extend_from_slice(&self.headers.to_bytes());
                out.push(b'\n');
                out.extend_from_slice(body);
                return;
            }
            Body::Multipart(children) => children,
        };

        let rendered: Vec<Vec<u8>> = children.iter().map(|child| child.to_bytes()).collect();
        let content_type = self.content_type();

        let boundary = if let Some(boundary) = content_type.boundary() {
            out.extend_from_slice(&self.headers.to_bytes());
            boundary.to_string()
        } else {
            let boundary = generate_boundary(&rendered);
            let mut headers = self.headers.clone();
            headers.set(
                "Content-Type",
                content_type
                    .with_parameter("boundary", boundary.as_str())
                    .to_string(),
            );
            out.extend_from_slice(&headers.to_bytes());
            boundary
        };
        out.push(b'\n');

        if let Some(preamble) = &self.preamble {
            out.extend_from_slice(preamble);
            out.push(b'\n');
        }

        for child in &rendered {
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(child);
            out.push(b'\n');
        }

        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.epilogue.as_deref().unwrap_or(b"\n"));
    }
}

fn generate_boundary(children: &[Vec<u8>]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let token: u64 = rng.gen_range(0..10_000_000_000_000_000_000);
        let boundary = format!("==============={token:019}==");
        let delimiter = format!("--{boundary}");
        let clashes = children
            .iter()
            .any(|child| child.windows(delimiter.len()).any(|w| w == delimiter.as_bytes()));
        if !clashes {
            return boundary;
        }
    }
}
