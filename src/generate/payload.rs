use serde::Serialize;

/// JSON body of a text-to-image inference request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct InferenceParameters {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for InferenceParameters {
    fn default() -> Self {
        Self {
            num_inference_steps: 30,
            guidance_scale: 7.5,
            width: 512,
            height: 512,
        }
    }
}

impl<'a> InferenceRequest<'a> {
    pub fn new(inputs: &'a str) -> Self {
        Self {
            inputs,
            parameters: InferenceParameters::default(),
        }
    }
}
